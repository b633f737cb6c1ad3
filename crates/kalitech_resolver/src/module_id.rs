/// Canonical module identifier: lower case path segments, forward slashes,
/// no leading `./`, no `//`, no trailing slash; extension-preserving (§3
/// `ModuleId`).
pub type ModuleId = String;

/// Normalize a raw request/path into canonical `ModuleId` form.
///
/// Rules, applied left-to-right (§4.A):
/// 1. replace backslashes with `/`
/// 2. strip leading `./` and `/`
/// 3. collapse runs of `/`
/// 4. strip trailing `/`
/// 5. trim whitespace
///
/// Case is preserved. `normalize(normalize(x)) == normalize(x)` (§8 #1).
pub fn normalize(raw: &str) -> ModuleId {
    let mut s = raw.trim().replace('\\', "/");

    loop {
        if let Some(rest) = s.strip_prefix("./") {
            s = rest.to_string();
            continue;
        }
        if let Some(rest) = s.strip_prefix('/') {
            s = rest.to_string();
            continue;
        }
        break;
    }

    let mut collapsed = String::with_capacity(s.len());
    let mut prev_slash = false;
    for c in s.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        collapsed.push(c);
    }

    while collapsed.ends_with('/') {
        collapsed.pop();
    }

    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent() {
        for raw in [
            "./Scripts/main.js",
            "Scripts//core/../cam.js",
            "\\Scripts\\main.js",
            "  Scripts/main.js  ",
            "///a///b//",
        ] {
            let once = normalize(raw);
            let twice = normalize(&once);
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn strips_leading_dot_slash_and_collapses() {
        assert_eq!(normalize("./Scripts/main.js"), "Scripts/main.js");
        assert_eq!(normalize("Scripts//core///cam.js"), "Scripts/core/cam.js");
        assert_eq!(normalize("Scripts/main.js/"), "Scripts/main.js");
    }

    #[test]
    fn preserves_case() {
        assert_eq!(normalize("./Scripts/Main.JS"), "Scripts/Main.JS");
    }
}
