//! Filename classification and output path rewriting
//!
//! The compiler only picks up files whose extension is in a known set.
//! The set can be overridden per run, for example to compile `.cjs` files.

/// Extensions recognized as compilable source input when no override is given.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".jsx", ".es6", ".es", ".mjs", ".ts", ".tsx"];

/// An ordered set of file extensions (dot included) that are considered
/// compilable source input. Immutable for the duration of one traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    exts: Vec<String>,
}

impl Default for ExtensionSet {
    fn default() -> Self {
        Self {
            exts: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl ExtensionSet {
    /// Create a set from caller-supplied extensions, replacing the defaults.
    pub fn new<I, S>(exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exts: exts.into_iter().map(|e| e.into()).collect(),
        }
    }

    /// Test if a filename ends with a compilable extension.
    ///
    /// The extension is the text after the last `.` of the bare filename,
    /// dot included. Membership is an exact, case-sensitive match.
    /// A filename without a dot (or with only a leading dot) has no
    /// extension and is never compilable.
    pub fn is_compilable(&self, filename: &str) -> bool {
        match extension_of(filename) {
            Some(ext) => self.exts.iter().any(|e| e == ext),
            None => false,
        }
    }
}

/// Get the extension of a bare filename, dot included.
///
/// A leading dot marks a dotfile, not an extension, so `.gitignore`
/// has no extension while `.hidden.ts` has `.ts`.
fn extension_of(filename: &str) -> Option<&str> {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => Some(&filename[idx..]),
        _ => None,
    }
}

/// Rewrite a relative source path into the path the compiled output is
/// written to.
///
/// With `keep_file_extension` the path is returned unchanged. Otherwise the
/// trailing extension (a `.` followed by zero or more word characters at the
/// very end of the path) is stripped and `.js` is appended. Only the final
/// extension is stripped: `a/b.test.ts` becomes `a/b.test.js`. A path with
/// no extension at all still gets `.js` appended: `README` becomes
/// `README.js`.
pub fn adjust_relative(relative: &str, keep_file_extension: bool) -> String {
    if keep_file_extension {
        return relative.to_string();
    }
    let stripped = match relative.rfind('.') {
        Some(idx) if is_word(&relative[idx + 1..]) => &relative[..idx],
        _ => relative,
    };
    format!("{stripped}.js")
}

fn is_word(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
