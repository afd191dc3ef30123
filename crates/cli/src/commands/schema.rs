use modkit_mod_protocol::SettingsDocument;
use schemars::schema_for;

/// Prints the JSON schema mod settings files follow.
pub fn schema() -> color_eyre::Result<()> {
    let schema = schema_for!(SettingsDocument);
    println!("{}", serde_json::to_string_pretty(&schema)?);

    Ok(())
}
