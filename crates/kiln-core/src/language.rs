//! Language classification for open documents.
//!
//! A pure, total mapping from file names to semantic language tags,
//! plus the per-language starter templates used for new documents.
//! Unknown or missing extensions always classify as [`Language::PlainText`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use strum::{Display, EnumString};

/// Semantic language tag attached to a document.
///
/// The tag is derived once when the document is opened or created and
/// changes only through an explicit user override.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Cpp,
    CSharp,
    Php,
    Go,
    Rust,
    Html,
    Css,
    Scss,
    Sass,
    Less,
    Json,
    Markdown,
    Ruby,
    Shell,
    Yaml,
    Xml,
    Sql,
    Kotlin,
    Swift,
    Dart,
    R,
    Scala,
    Perl,
    Lua,
    Toml,
    Ini,
    Dockerfile,
    Vim,
    #[default]
    PlainText,
}

/// Static storage for the extension table (initialized once).
static EXTENSION_TABLE: OnceLock<HashMap<&'static str, Language>> = OnceLock::new();

fn extension_table() -> &'static HashMap<&'static str, Language> {
    use Language::*;
    EXTENSION_TABLE.get_or_init(|| {
        HashMap::from([
            ("js", JavaScript),
            ("jsx", JavaScript),
            ("mjs", JavaScript),
            ("ts", TypeScript),
            ("tsx", TypeScript),
            ("py", Python),
            ("pyw", Python),
            ("java", Java),
            ("cpp", Cpp),
            ("c", Cpp),
            ("cc", Cpp),
            ("cxx", Cpp),
            ("h", Cpp),
            ("hpp", Cpp),
            ("cs", CSharp),
            ("php", Php),
            ("phtml", Php),
            ("go", Go),
            ("rs", Rust),
            ("html", Html),
            ("htm", Html),
            ("css", Css),
            ("scss", Scss),
            ("sass", Sass),
            ("less", Less),
            ("json", Json),
            ("jsonc", Json),
            ("md", Markdown),
            ("markdown", Markdown),
            ("rb", Ruby),
            ("sh", Shell),
            ("bash", Shell),
            ("zsh", Shell),
            ("yml", Yaml),
            ("yaml", Yaml),
            ("xml", Xml),
            ("xhtml", Xml),
            ("xsl", Xml),
            ("sql", Sql),
            ("kt", Kotlin),
            ("swift", Swift),
            ("dart", Dart),
            ("r", R),
            ("scala", Scala),
            ("pl", Perl),
            ("lua", Lua),
            ("toml", Toml),
            ("ini", Ini),
            ("cfg", Ini),
            ("conf", Ini),
            ("dockerfile", Dockerfile),
            ("vim", Vim),
            ("txt", PlainText),
            ("log", PlainText),
            ("env", PlainText),
        ])
    })
}

/// Extracts the final extension of a file name or path, lowercased.
fn final_extension(name_or_path: &str) -> Option<String> {
    let name = name_or_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name_or_path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

impl Language {
    /// Classifies a file name or path into a language tag.
    ///
    /// Total function: strips to the final extension (case-insensitive)
    /// and falls back to [`Language::PlainText`] for anything unknown.
    pub fn classify(name_or_path: &str) -> Language {
        final_extension(name_or_path)
            .and_then(|ext| extension_table().get(ext.as_str()).copied())
            .unwrap_or(Language::PlainText)
    }

    /// Returns the starter template used for new documents of this language.
    pub fn template(&self) -> String {
        match self {
            Language::Python => "# Python file\n# Start coding here...\n\ndef main():\n    print(\"Hello, World!\")\n\nif __name__ == \"__main__\":\n    main()".to_string(),
            Language::JavaScript => "// JavaScript file\n// Start coding here...\n\nfunction hello() {\n    console.log(\"Hello, World!\");\n}\n\nhello();".to_string(),
            Language::TypeScript => "// TypeScript file\n// Start coding here...\n\nfunction hello(): void {\n    console.log(\"Hello, World!\");\n}\n\nhello();".to_string(),
            Language::Java => "// Java file\n// Start coding here...\n\npublic class Main {\n    public static void main(String[] args) {\n        System.out.println(\"Hello, World!\");\n    }\n}".to_string(),
            Language::Cpp => "// C++ file\n// Start coding here...\n\n#include <iostream>\n\nint main() {\n    std::cout << \"Hello, World!\" << std::endl;\n    return 0;\n}".to_string(),
            Language::CSharp => "// C# file\n// Start coding here...\n\nusing System;\n\nclass Program {\n    static void Main() {\n        Console.WriteLine(\"Hello, World!\");\n    }\n}".to_string(),
            Language::Go => "// Go file\n// Start coding here...\n\npackage main\n\nimport \"fmt\"\n\nfunc main() {\n    fmt.Println(\"Hello, World!\")\n}".to_string(),
            Language::Rust => "// Rust file\n// Start coding here...\n\nfn main() {\n    println!(\"Hello, World!\");\n}".to_string(),
            Language::Html => "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n    <meta charset=\"UTF-8\">\n    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n    <title>Document</title>\n</head>\n<body>\n    <h1>Hello, World!</h1>\n</body>\n</html>".to_string(),
            Language::Css => "/* CSS file */\n/* Start styling here... */\n\nbody {\n    font-family: Arial, sans-serif;\n    margin: 0;\n    padding: 20px;\n}".to_string(),
            Language::Php => "<?php\n// PHP file\n// Start coding here...\n\necho \"Hello, World!\";\n?>".to_string(),
            Language::Ruby => "# Ruby file\n# Start coding here...\n\nputs \"Hello, World!\"".to_string(),
            other => format!("// {} file\n// Start coding here...\n", other.to_string().to_uppercase()),
        }
    }

    /// Returns the extension a renamed untitled document should carry.
    pub fn preferred_extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::JavaScript => "js",
            Language::TypeScript => "ts",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::CSharp => "cs",
            Language::Html => "html",
            Language::Css => "css",
            _ => "txt",
        }
    }
}

/// Maps a runnable file name to the executor that handles it.
///
/// The table is keyed on the file extension, not the language tag:
/// `.c` and `.cpp` both classify as C++, but compile with different
/// executors.
pub fn executor_for(file_name: &str) -> Option<&'static str> {
    match final_extension(file_name)?.as_str() {
        "py" => Some("python"),
        "js" => Some("node"),
        "java" => Some("java"),
        "cpp" => Some("g++"),
        "c" => Some("gcc"),
        _ => None,
    }
}

/// Extensions the `run` command knows how to execute.
pub const RUNNABLE_EXTENSIONS: &str = ".py, .js, .java, .cpp, .c";
