//! Grid square naming utilities.
//!
//! This module provides functions for validating 10x10km grid square names
//! and deriving the on-disk names used by an unpacked Terrain 50 download.
//!
//! # Naming convention
//!
//! A 10x10km square is named by its enclosing 100x100km square letter pair
//! followed by two digits, e.g. `NY12`. The letter `I` is not used in the
//! grid alphabet. The unpacked data set stores each square as
//!
//! ```text
//! <data>/<letters lower-case>/<name lower-case>_OST50GRID_<date>.zip
//! ```
//!
//! with the archive containing `<NAME upper-case>.asc`.

/// Validate a 10x10km square name and return its canonical (upper-case) form.
///
/// Accepts any mix of case; rejects anything that is not exactly two grid
/// letters followed by two digits.
///
/// # Examples
///
/// ```
/// use terr50::squares::canonical_square_name;
///
/// assert_eq!(canonical_square_name("ny12"), Some("NY12".to_string()));
/// assert_eq!(canonical_square_name("Tq00"), Some("TQ00".to_string()));
/// assert_eq!(canonical_square_name("NI12"), None); // 'I' is not a grid letter
/// assert_eq!(canonical_square_name("NY1"), None);
/// assert_eq!(canonical_square_name("N912"), None);
/// ```
pub fn canonical_square_name(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    if bytes.len() != 4 {
        return None;
    }

    let grid_letter = |b: u8| b.is_ascii_alphabetic() && !b.eq_ignore_ascii_case(&b'I');
    if !grid_letter(bytes[0]) || !grid_letter(bytes[1]) {
        return None;
    }
    if !bytes[2].is_ascii_digit() || !bytes[3].is_ascii_digit() {
        return None;
    }

    Some(name.to_uppercase())
}

/// The data sub-folder holding a square's archive: the lower-cased letter
/// pair of its 100x100km square.
///
/// Expects a canonical name (see [`canonical_square_name`]).
///
/// # Examples
///
/// ```
/// use terr50::squares::data_folder_name;
///
/// assert_eq!(data_folder_name("NY12"), "ny");
/// ```
pub fn data_folder_name(name: &str) -> String {
    name[..2].to_lowercase()
}

/// The `.asc` file name for a square, as found inside its archive.
///
/// # Examples
///
/// ```
/// use terr50::squares::asc_entry_name;
///
/// assert_eq!(asc_entry_name("NY12"), "NY12.asc");
/// ```
pub fn asc_entry_name(name: &str) -> String {
    format!("{}.asc", name)
}

/// The file-name prefix of a square's zip archive. Actual archives carry a
/// date suffix (e.g. `ny12_OST50GRID_20180619.zip`), so only the prefix and
/// the `.zip` extension can be predicted.
///
/// # Examples
///
/// ```
/// use terr50::squares::archive_prefix;
///
/// assert_eq!(archive_prefix("NY12"), "ny12");
/// ```
pub fn archive_prefix(name: &str) -> String {
    name.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert_eq!(canonical_square_name("NY12").as_deref(), Some("NY12"));
        assert_eq!(canonical_square_name("sd09").as_deref(), Some("SD09"));
        assert_eq!(canonical_square_name("hP40").as_deref(), Some("HP40"));
    }

    #[test]
    fn test_invalid_names() {
        for bad in ["", "NY", "NY123", "NYAB", "1212", "N 12", "IV12", "nI00"] {
            assert_eq!(canonical_square_name(bad), None, "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_derived_names() {
        assert_eq!(data_folder_name("NY12"), "ny");
        assert_eq!(asc_entry_name("NY12"), "NY12.asc");
        assert_eq!(archive_prefix("NY12"), "ny12");
    }
}
