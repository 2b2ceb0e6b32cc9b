// src/scan/classify.rs
// =============================================================================
// Text vs binary classification.
//
// Two signals, checked in order:
// 1. A fixed allow-list of extensions and well-known file names (docs,
//    source code, config and markup) is always text
// 2. Otherwise the first kilobyte is sniffed: any control byte other than
//    the usual whitespace/escape characters means binary
//
// Rust concepts:
// - Slices (&[u8]): look at bytes without copying them
// - matches! with ranges: 0x07..=0x0D in a single pattern
// =============================================================================

/// How many leading bytes are inspected when sniffing.
pub const SNIFF_LEN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Text,
    Binary,
}

const TEXT_EXTENSIONS: &[&str] = &[
    // documents
    "md", "markdown", "mdx", "txt", "rst", "adoc", "org", "tex", "csv", "tsv",
    // source code
    "rs", "ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "pyi", "go", "java", "kt", "kts",
    "scala", "c", "h", "cc", "cpp", "cxx", "hpp", "hh", "cs", "fs", "rb", "php", "swift",
    "m", "mm", "dart", "lua", "r", "jl", "pl", "pm", "ex", "exs", "erl", "hrl", "hs", "ml",
    "mli", "clj", "cljs", "elm", "zig", "nim", "v", "sol", "vue", "svelte", "astro",
    "sh", "bash", "zsh", "fish", "ps1", "bat", "cmd", "sql", "graphql", "gql", "proto",
    // config and markup
    "json", "jsonc", "json5", "yaml", "yml", "toml", "ini", "cfg", "conf", "properties",
    "env", "xml", "html", "htm", "css", "scss", "sass", "less", "svg", "tf", "hcl",
    "gradle", "lock", "editorconfig", "gitignore", "gitattributes", "dockerignore",
];

const TEXT_FILE_NAMES: &[&str] = &[
    "makefile", "dockerfile", "license", "licence", "readme", "changelog", "authors",
    "contributing", "notice", "copying", "gemfile", "rakefile", "procfile", "justfile",
    "vagrantfile", "codeowners",
];

/// True when the path's extension or file name is on the text allow-list.
pub fn is_text_path(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
    if TEXT_FILE_NAMES.contains(&name.as_str()) {
        return true;
    }
    match name.rsplit_once('.') {
        Some((_, ext)) => TEXT_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// True when `head` contains a control byte outside tab, newline, carriage
/// return, vertical tab, form feed, backspace, bell and escape.
pub fn looks_binary(head: &[u8]) -> bool {
    head.iter().any(|&b| {
        (b < 0x20 && !matches!(b, 0x07..=0x0D | 0x1B)) || b == 0x7F
    })
}

pub fn classify(path: &str, head: &[u8]) -> Classification {
    if is_text_path(path) || !looks_binary(&head[..head.len().min(SNIFF_LEN)]) {
        Classification::Text
    } else {
        Classification::Binary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_listed_paths() {
        assert!(is_text_path("src/main.rs"));
        assert!(is_text_path("docs/Guide.MD"));
        assert!(is_text_path("Makefile"));
        assert!(is_text_path("web/.gitignore"));
        assert!(!is_text_path("assets/logo.png"));
        assert!(!is_text_path("bin/tool"));
    }

    #[test]
    fn test_sniffing() {
        assert!(!looks_binary(b"plain text\twith\r\nwhitespace\x1b[0m"));
        assert!(looks_binary(b"\x89PNG\r\n\x1a\n\x00\x00"));
        assert!(looks_binary(b"abc\x00def"));
        assert!(!looks_binary("héllo wörld".as_bytes()));
    }

    #[test]
    fn test_classify_prefers_allow_list() {
        assert_eq!(classify("notes.txt", b"\x00\x01"), Classification::Text);
        assert_eq!(classify("data.bin", b"\x00\x01"), Classification::Binary);
        assert_eq!(classify("LICENSE-APACHE", b"Apache License"), Classification::Text);
    }

    #[test]
    fn test_only_first_kilobyte_is_sniffed() {
        let mut head = vec![b'a'; SNIFF_LEN];
        head.push(0);
        assert_eq!(classify("blob", &head), Classification::Text);
    }
}
