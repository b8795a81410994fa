//! File-name rules per platform family.

/// Forbidden-character rules for a single path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRules {
    /// `/`, NUL and control characters.
    Posix,
    /// `\ / < > : " ' | ? *` and control characters.
    Windows,
}

impl NameRules {
    /// Rules for the platform this binary was built for.
    pub fn native() -> Self {
        if cfg!(windows) {
            NameRules::Windows
        } else {
            NameRules::Posix
        }
    }

    pub fn is_forbidden(self, c: char) -> bool {
        if c.is_control() {
            return true;
        }
        match self {
            NameRules::Posix => c == '/',
            NameRules::Windows => matches!(c, '\\' | '/' | '<' | '>' | ':' | '"' | '\'' | '|' | '?' | '*'),
        }
    }

    /// A usable file name is non-empty, not `.`/`..`, and free of forbidden characters.
    pub fn is_valid(self, name: &str) -> bool {
        !name.is_empty() && name != "." && name != ".." && !name.chars().any(|c| self.is_forbidden(c))
    }

    /// Strip forbidden characters and surrounding whitespace.
    pub fn sanitize(self, name: &str) -> String {
        name.chars()
            .filter(|c| !self.is_forbidden(*c))
            .collect::<String>()
            .trim()
            .to_string()
    }
}

/// Text before the first `.` of a plain file name.
pub fn file_stem(name: &str) -> &str {
    name.split('.').next().unwrap_or("")
}

/// Text after the last `.` of a plain file name, or empty when there is none
/// or it would be empty.
pub fn file_extension(name: &str, with_dot: bool) -> &str {
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => {
            if with_dot {
                &name[idx..]
            } else {
                &name[idx + 1..]
            }
        }
        _ => "",
    }
}
