//! Key names the console accepts when rebinding, and typo suggestions for anything else.

const KNOWN_KEYS: &[&str] = &[
    "A",
    "Add",
    "Apostrophe",
    "Asterix",
    "B",
    "BackSpace",
    "Backslash",
    "C",
    "CapsLock",
    "Comma",
    "D",
    "Decimal",
    "Delete",
    "Divide",
    "Down",
    "E",
    "Eight",
    "End",
    "Enter",
    "Equals",
    "Escape",
    "F",
    "F1",
    "F10",
    "F11",
    "F12",
    "F2",
    "F3",
    "F4",
    "F5",
    "F6",
    "F7",
    "F8",
    "F9",
    "Five",
    "Four",
    "G",
    "Gamepad_DPad_Down",
    "Gamepad_DPad_Left",
    "Gamepad_DPad_Right",
    "Gamepad_DPad_Up",
    "Gamepad_FaceButton_Bottom",
    "Gamepad_FaceButton_Left",
    "Gamepad_FaceButton_Right",
    "Gamepad_FaceButton_Top",
    "Gamepad_LeftShoulder",
    "Gamepad_LeftThumbstick",
    "Gamepad_LeftTrigger",
    "Gamepad_LeftTriggerAxis",
    "Gamepad_LeftX",
    "Gamepad_LeftY",
    "Gamepad_RightShoulder",
    "Gamepad_RightThumbstick",
    "Gamepad_RightTrigger",
    "Gamepad_RightTriggerAxis",
    "Gamepad_RightX",
    "Gamepad_RightY",
    "Gamepad_Special_Left",
    "Gamepad_Special_Right",
    "H",
    "Home",
    "Hyphen",
    "I",
    "Insert",
    "J",
    "K",
    "L",
    "Left",
    "LeftAlt",
    "LeftBracket",
    "LeftControl",
    "LeftMouseButton",
    "LeftShift",
    "M",
    "MiddleMouseButton",
    "MouseScrollDown",
    "MouseScrollUp",
    "MouseWheelAxis",
    "Multiply",
    "N",
    "Nine",
    "NumLock",
    "NumPadEight",
    "NumPadFive",
    "NumPadFour",
    "NumPadNine",
    "NumPadOne",
    "NumPadSeven",
    "NumPadSix",
    "NumPadThree",
    "NumPadTwo",
    "NumPadZero",
    "O",
    "One",
    "P",
    "PageDown",
    "PageUp",
    "Pause",
    "Period",
    "Q",
    "R",
    "Right",
    "RightAlt",
    "RightBracket",
    "RightControl",
    "RightMouseButton",
    "RightShift",
    "S",
    "ScrollLock",
    "Semicolon",
    "Seven",
    "Six",
    "Slash",
    "SpaceBar",
    "Subtract",
    "T",
    "Tab",
    "Three",
    "ThumbMouseButton",
    "ThumbMouseButton2",
    "Tilde",
    "Two",
    "U",
    "Up",
    "V",
    "W",
    "X",
    "Y",
    "Z",
    "Zero",
];

/// The canonical spelling of a key name, matched ignoring case.
pub fn find_key(name: &str) -> Option<&'static str> {
    KNOWN_KEYS
        .iter()
        .find(|known| known.eq_ignore_ascii_case(name))
        .copied()
}

/// The known key closest to `invalid`, if any is close enough to be a likely typo.
///
/// Roughly a third of the characters involved may need changing, ignoring case. Ties go to the
/// key whose case matches more closely.
pub fn suggest_key(invalid: &str) -> Option<&'static str> {
    KNOWN_KEYS
        .iter()
        .copied()
        .filter(|known| *known != invalid)
        .map(|known| (known, key_distance(invalid, known)))
        .filter(|(known, (distance, _))| *distance <= (invalid.len() + known.len() + 3) / 6)
        .min_by_key(|(_, distance)| *distance)
        .map(|(known, _)| known)
}

/// Edit distance ignoring case, then the exact edit distance.
fn key_distance(a: &str, b: &str) -> (usize, usize) {
    (
        strsim::levenshtein(&a.to_ascii_lowercase(), &b.to_ascii_lowercase()),
        strsim::levenshtein(a, b),
    )
}
