use std::path::PathBuf;

use teelog::{LevelFilter, RotationPolicy, logger_config};

fn main() {
    let dir = PathBuf::from("/tmp/teelog_example_rotation");
    let _ = std::fs::remove_dir_all(&dir);
    let path = dir.join("app.log");

    logger_config()
        .no_stdout()
        .with_rotation(RotationPolicy {
            max_size: 4096,
            max_backups: Some(3),
            max_age: None,
            compress: true,
        })
        .with_log_file(&path, LevelFilter::Info)
        .init_global()
        .unwrap();

    for i in 0..200 {
        teelog::info!("Log message", number = i);
    }

    // Dropping the logger waits for compression and cleanup.
    teelog::reset();

    let backups = teelog::backups(&path).unwrap();
    println!("\n--- Rotation Summary ---");
    println!("Log directory: {}", dir.display());
    println!("Archives remaining (max_backups=3): {}", backups.len());
    for backup in &backups {
        println!("  {} (rotated at {})", backup.path.display(), backup.rotated_at);
    }
    assert!(backups.len() <= 3, "retention should keep at most 3 archives");
}
