use std::path::Path;

pub const BASE_DOC: &str = "\
# Test plan

| ID | Name |
| --- | --- |
| 1 | Alice |
| 2 | Bob |
| 3 | Carol |

---

Base notes.
";

/// Builds a result document holding a `ID | Score | Status` table followed by
/// a trailing section.
pub fn result_doc(rows: &[(&str, &str, &str)], notes: &str) -> String {
    let mut doc = String::from("| ID | Score | Status |\n|----|------:|:------:|\n");
    for (id, score, status) in rows {
        doc.push_str(&format!("| {id} | {score} | {status} |\n"));
    }
    if !notes.is_empty() {
        doc.push_str("\n---\n\n");
        doc.push_str(notes);
        doc.push('\n');
    }
    doc
}

pub fn write_file(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).expect("fixture should be written");
}
