//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Build a small, valid PDF with one page per entry of `pages`.
///
/// Each non-empty entry is drawn as a single Helvetica text line, so pdfium
/// finds it in the text layer. An empty entry gives a page with no text at
/// all, like a page of a scanned document.
pub fn build_pdf(pages: &[&str]) -> Vec<u8> {
    let n = pages.len();
    let kids: Vec<String> = (0..n).map(|i| format!("{} 0 R", 4 + 2 * i)).collect();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), n),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];
    for (i, text) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            5 + 2 * i
        ));
        let stream = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 18 Tf 72 700 Td ({text}) Tj ET")
        };
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}\nendstream",
            stream.len()
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, obj) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{obj}\nendobj\n", i + 1).as_bytes());
    }

    let xref = out.len();
    let header = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    out.extend_from_slice(header.as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

/// Write `bytes` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write test file");
    path
}

/// A fake espeak-ng: writes a RIFF header followed by the text it was given
/// to the `-w` path. Returns the engine command line.
#[cfg(unix)]
pub fn fake_engine(dir: &Path) -> String {
    let script = dir.join("fake-espeak.sh");
    std::fs::write(
        &script,
        "out=\"\"\n\
         while [ $# -gt 0 ]; do\n\
         \x20 if [ \"$1\" = \"-w\" ]; then shift; out=\"$1\"; fi\n\
         \x20 shift\n\
         done\n\
         printf 'RIFF' > \"$out\"\n\
         cat >> \"$out\"\n",
    )
    .expect("write fake engine");
    format!("sh '{}'", script.display())
}

/// `true` when integration tests needing pdfium should run.
pub fn pdfium_ready() -> bool {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run pdfium-backed tests");
        return false;
    }
    match pdf2audio::pipeline::extract::bind_pdfium() {
        Ok(_) => true,
        Err(e) => {
            println!("SKIP — pdfium not available: {e}");
            false
        }
    }
}
