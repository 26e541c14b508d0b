//! URL path normalization.

/// Canonicalize a URL path.
///
/// Applies the following rules iteratively until no further processing can
/// be done:
///
/// 1. Replace multiple slashes with a single slash.
/// 2. Eliminate each `.` path name element (the current directory).
/// 3. Eliminate each inner `..` path name element (the parent directory)
///    along with the non-`..` element that precedes it.
/// 4. Eliminate `..` elements that begin a rooted path, that is, replace
///    `/..` by `/` at the beginning of a path.
///
/// If the result of this process is an empty string, `/` is returned.
/// Unlike a filesystem cleaner, a trailing slash is preserved so the router
/// can still distinguish `/dir/` from `/dir`.
#[must_use]
pub fn clean_path(p: &str) -> String {
    if p.is_empty() {
        return String::from("/");
    }

    let bytes = p.as_bytes();
    let n = bytes.len();

    let mut out = String::with_capacity(n + 1);
    out.push('/');

    let mut r = usize::from(bytes[0] == b'/');
    let mut trailing = n > 1 && bytes[n - 1] == b'/';

    while r < n {
        match bytes[r] {
            b'/' => {
                // empty path element
                r += 1;
            }
            b'.' if r + 1 == n => {
                trailing = true;
                r += 1;
            }
            b'.' if bytes[r + 1] == b'/' => {
                // . element
                r += 2;
            }
            b'.' if bytes[r + 1] == b'.' && (r + 2 == n || bytes[r + 2] == b'/') => {
                // .. element: remove to the last '/'
                r += 3;
                if out.len() > 1 {
                    // search bytes: the element may end in a multi-byte
                    // character, but '/' is a char boundary
                    let parent = out.as_bytes()[..out.len() - 1]
                        .iter()
                        .rposition(|&c| c == b'/')
                        .unwrap_or(0);
                    out.truncate(parent.max(1));
                }
            }
            _ => {
                if out.len() > 1 {
                    out.push('/');
                }
                // copy the element verbatim; '/' is ASCII so this never
                // splits a multi-byte character
                let start = r;
                while r < n && bytes[r] != b'/' {
                    r += 1;
                }
                out.push_str(&p[start..r]);
            }
        }
    }

    if trailing && out.len() > 1 {
        out.push('/');
    }

    out
}
