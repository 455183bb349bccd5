use std::io::Write;
use std::os::unix::fs::PermissionsExt;

use tempfile::TempDir;

/// Testlere özel sahte kubectl: verilen sh gövdesini çalıştırılabilir bir
/// betik olarak tempdir'e yazar ve yolunu döner.
pub fn fake_kubectl(dir: &TempDir, body: &str) -> String {
    let path = dir.path().join("kubectl");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "#!/bin/sh").unwrap();
    writeln!(f, "{}", body).unwrap();
    let mut perms = f.metadata().unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path.to_string_lossy().into_owned()
}
