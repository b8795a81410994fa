//! Target names for derived files when the primary file is renamed.

use crate::tree::{file_extension, file_stem};

/// New name for `derived` after the primary went from `old_primary` to
/// `new_primary` (all plain file names).
///
/// `image-150x150.jpg` with `image.jpg -> new_image.png` gives
/// `new_image-150x150.png`.
pub fn derived_name(derived: &str, old_primary: &str, new_primary: &str) -> String {
    let without_ext = derived.rsplit_once('.').map_or(derived, |(head, _)| head);
    let old_base = file_stem(old_primary);
    let new_base = file_stem(new_primary);
    let renamed = if old_base.is_empty() {
        without_ext.to_string()
    } else {
        without_ext.replace(old_base, new_base)
    };
    format!("{renamed}{}", file_extension(new_primary, true))
}
