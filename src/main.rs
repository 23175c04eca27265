use log::{info, warn};
use medren::utils::list_files_walkdir_filtered;
use medren::{FilenameCheck, MedrenError, Resolver, cross_check_filename_timestamp};
use std::path::PathBuf;

fn main() -> Result<(), MedrenError> {
    env_logger::init();

    let mut files = Vec::new();
    for arg in std::env::args_os().skip(1) {
        let path = PathBuf::from(arg);
        if path.is_dir() {
            files.extend(list_files_walkdir_filtered(&path, false)?);
        } else {
            files.push(path);
        }
    }
    if files.is_empty() {
        eprintln!("usage: medren <file or directory>...");
        return Ok(());
    }
    info!("Found {} files", files.len());

    let resolver = Resolver::builder().parallel(true).build()?;
    info!("Active backends: {:?}", resolver.active_backends());

    let resolved = resolver.resolve_all(&files);
    for file in &resolved {
        if let FilenameCheck::Mismatch {
            from_filename,
            from_metadata,
        } = cross_check_filename_timestamp(&file.record)
        {
            warn!(
                "{}: filename says {from_filename}, metadata says {from_metadata}",
                file.path.display()
            );
        }
    }
    info!("Resolved {} of {} files", resolved.len(), files.len());

    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}
