use std::path::Path;

use directories::ProjectDirs;

#[derive(Debug)]
pub struct KnownDirs {
    /// The current working directory we launched from.
    cwd: Option<Box<Path>>,

    /// Linux installation prefix (defaults to /)
    #[cfg(target_os = "linux")]
    prefix: Option<Box<Path>>,

    project_dirs: Option<ProjectDirs>,
}

pub trait OptionalPathExt {
    fn join<P>(&self, path: P) -> Option<Box<Path>>
    where
        P: AsRef<Path>;
}

impl<S: AsRef<Path>> OptionalPathExt for Option<S> {
    fn join<P>(&self, path: P) -> Option<Box<Path>>
    where
        P: AsRef<Path>,
    {
        self.as_ref()
            .map(|parent| parent.as_ref().join(path).into_boxed_path())
    }
}

const PROJECT_QUALIFIER: &str = "io.github";
const PROJECT_ORG: &str = "modkit-sdk";
const PROJECT_NAME: &str = "modkit";

impl Default for KnownDirs {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir()
                .map(|cwd| cwd.into_boxed_path())
                .ok(),
            #[cfg(target_os = "linux")]
            prefix: Some(Box::from(Path::new("/"))),
            project_dirs: ProjectDirs::from(PROJECT_QUALIFIER, PROJECT_ORG, PROJECT_NAME),
        }
    }
}

impl KnownDirs {
    /// Discover the data directory. Mod settings live here unless configured otherwise.
    pub fn data_dir(&self) -> Option<Box<Path>> {
        self.project_dirs
            .as_ref()
            .map(|dirs| Box::from(dirs.data_local_dir()))
            .or(self.cwd.clone())
    }

    /// Where mod settings files are kept unless configured otherwise.
    pub fn settings_dir(&self) -> Option<Box<Path>> {
        self.data_dir().join("settings")
    }

    /// Discover the candidate paths to modkit configuration directories, ordered from least
    /// priority to highest.
    ///
    /// These can be one of the following:
    ///
    /// - $PREFIX/etc/modkit (Linux)
    /// - $XDG_CONFIG_DIR:=$HOME/.config/modkit (Linux)
    /// - %LOCALAPPDATA%/modkit-sdk/modkit/config (Windows)
    /// - the current directory
    pub fn config_dirs(&self) -> impl Iterator<Item = Box<Path>> {
        let config_dirs = [
            #[cfg(target_os = "linux")]
            self.prefix.join("etc/modkit"),
            self.project_dirs
                .as_ref()
                .map(|proj| Box::from(proj.config_local_dir())),
            self.cwd.clone(),
        ];

        config_dirs.into_iter().flatten()
    }
}
