use std::env;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("scores.rs");

    let mut code = String::new();
    code.push_str("/// Embedded score files, keyed by path relative to `library/`\n");
    code.push_str("pub static SCORES: &[(&str, &str)] = &[\n");

    let scores_dir = Path::new("library");

    if scores_dir.exists() {
        let mut entries: Vec<_> = WalkDir::new(scores_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "omni"))
            .collect();
        entries.sort_by(|a, b| a.path().cmp(b.path()));

        for entry in entries {
            let path = entry.path();
            let relative_path = path.strip_prefix(scores_dir).unwrap();
            let name = relative_path
                .with_extension("")
                .to_string_lossy()
                .replace('\\', "/");

            if let Ok(content) = fs::read_to_string(path) {
                // Debug formatting yields a valid Rust string literal
                code.push_str(&format!("    ({:?}, {:?}),\n", name, content));
            }
        }
    }

    code.push_str("];\n");

    fs::write(&dest_path, code).unwrap();

    println!("cargo:rerun-if-changed=library");
}
