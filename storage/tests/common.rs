use std::fs;
use tempfile::TempDir;

/// Build a small site tree under a temporary directory.
pub fn create_test_structure() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    fs::create_dir_all(root.join("css")).unwrap();
    fs::create_dir_all(root.join("js/vendor")).unwrap();
    fs::create_dir_all(root.join("empty_dir")).unwrap();

    fs::write(root.join("index.html"), b"<h1>home</h1>").unwrap();
    fs::write(root.join("about.html"), b"<h1>about</h1>").unwrap();
    fs::write(root.join("css/site.css"), b"body{}").unwrap();
    fs::write(root.join("js/app.js"), b"run()").unwrap();
    fs::write(root.join("js/vendor/lib.js"), b"lib()").unwrap();
    fs::write(root.join("empty_file.txt"), b"").unwrap();

    temp_dir
}
