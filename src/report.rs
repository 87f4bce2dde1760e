use std::path::{Path, PathBuf};

use postlens::clustering::ClusteredPost;

/// Reporting collaborator: dumps the enriched clustering table as CSV.
/// Invoked once after clustering completes; a failed export is logged by
/// the caller and never fails the request.
pub fn write_csv(table: &[ClusteredPost], dir: &Path) -> Result<PathBuf, String> {
    let mut csv = String::from("timestamp,likesCount,commentsCount,Hour,Engagement,Cluster\n");
    for row in table {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            row.timestamp.to_rfc3339(),
            row.likes_count,
            row.comments_count,
            row.hour,
            row.engagement,
            row.cluster
        ));
    }

    std::fs::create_dir_all(dir).map_err(|err| format!("failed to create export dir: {}", err))?;
    let path = dir.join("data.csv");
    std::fs::write(&path, csv).map_err(|err| format!("failed to write export: {}", err))?;
    Ok(path)
}
