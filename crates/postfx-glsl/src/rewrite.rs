//! Whole-word symbol renaming and shader-convention scanning
//!
//! Merging many effect fragments into one program concatenates their GLSL
//! text, so every effect-local symbol (uniforms, defines, helper functions,
//! varyings) is renamed to `prefix + Capitalize(name)` before splicing.
//! Renaming is purely textual: a word-bounded match of the bare name, with
//! member accesses (`foo.name`) left untouched.

use std::sync::OnceLock;

use regex::Regex;

/// Function-signature pattern: a return type followed by an identifier and a
/// parameter list opening a block. Good enough for the declaration style the
/// shader conventions require; calls and prototypes are not matched.
fn function_regex() -> &'static Regex {
    static FUNCTION_REGEX: OnceLock<Regex> = OnceLock::new();
    FUNCTION_REGEX.get_or_init(|| {
        Regex::new(r"(?:\w+\s+)(\w+)\([\w\s,]*\)\s*\{").expect("Invalid function regex")
    })
}

/// Varying declaration pattern: `varying <type> <name>`.
fn varying_regex() -> &'static Regex {
    static VARYING_REGEX: OnceLock<Regex> = OnceLock::new();
    VARYING_REGEX
        .get_or_init(|| Regex::new(r"varying\s+\w+\s+(\w+)").expect("Invalid varying regex"))
}

/// Uppercase the first character of an identifier.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Collect the names of all functions defined in a shader source.
///
/// The entry-point conventions (`mainImage`, `mainUv`, `mainSupport`) are
/// included; they are renamed like any other symbol and the merged program
/// calls them under their prefixed names.
pub fn find_function_names(source: &str) -> Vec<String> {
    function_regex()
        .captures_iter(source)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Collect the names of all varyings declared in a shader source.
pub fn find_varying_names(source: &str) -> Vec<String> {
    varying_regex()
        .captures_iter(source)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Rewrite every whole-word occurrence of each name in each target string to
/// `prefix + Capitalize(name)`, skipping occurrences immediately preceded by
/// `.` (member access on some other value).
///
/// Names are processed in the order given. If one name is a prefix of another
/// (`size` and `sizeFactor`), processing the shorter one first corrupts the
/// longer one; callers pass names in discovery order and this hazard is
/// knowingly preserved.
pub fn prefix_substrings<'a, N, T>(prefix: &str, names: N, targets: T)
where
    N: IntoIterator<Item = &'a str>,
    T: IntoIterator<Item = &'a mut String>,
{
    let mut targets: Vec<&mut String> = targets.into_iter().collect();

    for name in names {
        if name.is_empty() {
            continue;
        }

        // Escaped literal between word boundaries; cannot fail to compile.
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(name)))
            .expect("Invalid symbol regex");
        let replacement = format!("{}{}", prefix, capitalize(name));

        for target in targets.iter_mut() {
            let original = target.clone();
            let rewritten = pattern.replace_all(&original, |caps: &regex::Captures| {
                let m = caps.get(0).expect("match group 0");
                // `regex` has no lookbehind; checking the byte before the
                // match gives the same member-access exception.
                if m.start() > 0 && original.as_bytes()[m.start() - 1] == b'.' {
                    m.as_str().to_string()
                } else {
                    replacement.clone()
                }
            });

            if let std::borrow::Cow::Owned(s) = rewritten {
                **target = s;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("amplitude"), "Amplitude");
        assert_eq!(capitalize("mainImage"), "MainImage");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_find_function_names() {
        let source = "
            float luminance(const in vec3 color) {
                return dot(color, vec3(0.299, 0.587, 0.114));
            }

            void mainImage(const in vec4 inputColor, const in vec2 uv, out vec4 outputColor) {
                outputColor = inputColor;
            }
        ";

        let names = find_function_names(source);
        assert_eq!(names, vec!["luminance", "mainImage"]);
    }

    #[test]
    fn test_find_varying_names() {
        let source = "
            varying vec2 vOffset;
            varying float vIntensity;
        ";

        assert_eq!(find_varying_names(source), vec!["vOffset", "vIntensity"]);
    }

    #[test]
    fn test_prefix_whole_words() {
        let mut source = String::from("uniform float amplitude; x *= amplitude;");
        prefix_substrings("e2", ["amplitude"], [&mut source]);
        assert_eq!(source, "uniform float e2Amplitude; x *= e2Amplitude;");
    }

    #[test]
    fn test_member_access_untouched() {
        let mut source = String::from("y = foo.amplitude + amplitude;");
        prefix_substrings("e2", ["amplitude"], [&mut source]);
        assert_eq!(source, "y = foo.amplitude + e2Amplitude;");
    }

    #[test]
    fn test_no_partial_word_matches() {
        let mut source = String::from("float amplitudeScale = amplitude;");
        prefix_substrings("e0", ["amplitude"], [&mut source]);
        assert_eq!(source, "float amplitudeScale = e0Amplitude;");
    }

    #[test]
    fn test_multiple_targets() {
        let mut frag = String::from("color *= speed;");
        let mut vert = String::from("offset = speed * time;");
        prefix_substrings("e1", ["speed"], [&mut frag, &mut vert]);
        assert_eq!(frag, "color *= e1Speed;");
        assert_eq!(vert, "offset = e1Speed * time;");
    }

    // Names are processed in discovery order with no longest-first guard.
    // Word boundaries happen to keep the `size`/`sizeFactor` pair intact in
    // either order; this pins the observed behavior rather than a guarantee.
    #[test]
    fn rename_order_follows_discovery_order() {
        let mut source = String::from("x = size * sizeFactor;");
        prefix_substrings("e0", ["size", "sizeFactor"], [&mut source]);
        assert_eq!(source, "x = e0Size * e0SizeFactor;");

        let mut reversed = String::from("x = size * sizeFactor;");
        prefix_substrings("e0", ["sizeFactor", "size"], [&mut reversed]);
        assert_eq!(reversed, "x = e0Size * e0SizeFactor;");
    }
}
