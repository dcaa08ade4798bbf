//! Version banner stripping.

use std::sync::LazyLock;

use regex::Regex;

#[expect(clippy::expect_used, reason = "the pattern is a compile-time literal")]
static VERSION_BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Type definitions for Electron \S").expect("banner pattern should compile")
});

/// Removes every line carrying the generated-definitions version banner.
///
/// All other lines keep their content, line endings, and order, so applying
/// the function twice gives the same result as applying it once.
///
/// ```
/// use archaeologist::dts::normalize;
///
/// let document = "// Type definitions for Electron 30.0.0\ninterface Foo {}\n";
/// assert_eq!(normalize(document), "interface Foo {}\n");
/// ```
#[must_use]
pub fn normalize(document: &str) -> String {
    document
        .split_inclusive('\n')
        .filter(|line| !VERSION_BANNER.is_match(line))
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::normalize;

    #[rstest]
    #[case::leading_banner(
        "Type definitions for Electron 1.2.3\ninterface Foo {\n  bar: string;\n}",
        "interface Foo {\n  bar: string;\n}"
    )]
    #[case::multiple_banners(
        "Type definitions for Electron 1.2.3\ninterface Foo {\n  bar: string;\n}\nType definitions for Electron 2.0.0\ninterface Baz {}",
        "interface Foo {\n  bar: string;\n}\ninterface Baz {}"
    )]
    #[case::commented_banner(
        "// Type definitions for Electron 30.0.0-nightly.20240101\n// Project: http://electronjs.org/\ndeclare namespace Electron {}\n",
        "// Project: http://electronjs.org/\ndeclare namespace Electron {}\n"
    )]
    #[case::trailing_banner_without_newline(
        "interface Foo {}\nType definitions for Electron 9.9.9",
        "interface Foo {}\n"
    )]
    #[case::no_banner("interface Foo {\n  bar: string;\n}", "interface Foo {\n  bar: string;\n}")]
    #[case::empty("", "")]
    #[case::crlf_line_endings(
        "Type definitions for Electron 1.0.0\r\ninterface Foo {}\r\n",
        "interface Foo {}\r\n"
    )]
    fn strips_banner_lines(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[rstest]
    #[case("Type definitions for Electron 1.2.3\na\nType definitions for Electron 4.5.6\nb\n")]
    #[case("no banner at all\n")]
    #[case("Type definitions for Electron \nstill kept?\n")]
    #[case("")]
    fn is_idempotent(#[case] input: &str) {
        let once = normalize(input);
        assert_eq!(normalize(&once), once);
    }

    #[rstest]
    fn documents_differing_only_in_banner_normalize_equal() {
        let old = "// Type definitions for Electron 29.0.0\ninterface App { quit(): void; }\n";
        let new = "// Type definitions for Electron 30.0.0\ninterface App { quit(): void; }\n";
        assert_eq!(normalize(old), normalize(new));
    }
}
