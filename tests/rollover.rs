use std::fs;
use std::path::{Path, PathBuf};

use taskq::segment::FILENAME_PREFIX;
use taskq::{BytesCodec, FlatFileTaskCollection};
use tempfile::tempdir;

const ROLL_SIZE: u64 = 10;

type ByteQueue = FlatFileTaskCollection<Vec<u8>, BytesCodec>;

fn open_queue(data_dir: &Path) -> ByteQueue {
    FlatFileTaskCollection::open(data_dir, BytesCodec, ROLL_SIZE).expect("queue open")
}

fn segment_files(data_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(data_dir)
        .expect("read_dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(FILENAME_PREFIX))
        })
        .collect();
    files.sort();
    files
}

fn add_item(queue: &ByteQueue, tasks: &mut Vec<Vec<u8>>, value: u8) {
    tasks.push(vec![value]);
    queue.add(&vec![value]).expect("add");
}

#[test]
fn rolls_files_when_size_exceeded() {
    let dir = tempdir().expect("tempdir");
    let data_dir = dir.path().join("queue");
    let queue = open_queue(&data_dir);
    let mut tasks: Vec<Vec<u8>> = Vec::new();

    add_item(&queue, &mut tasks, 0);
    let current = segment_files(&data_dir);
    assert_eq!(current.len(), 1);
    let first_file = current[0].clone();
    let mut tasks_in_first_file: u8 = 1;
    while segment_files(&data_dir).len() == 1 {
        add_item(&queue, &mut tasks, tasks_in_first_file);
        tasks_in_first_file += 1;
    }

    assert!(segment_files(&data_dir).len() > 1);
    assert!(segment_files(&data_dir).contains(&first_file));

    // Add an extra item to be sure we have at least one in a later file.
    add_item(&queue, &mut tasks, 123);

    let mut removed: Vec<Vec<u8>> = Vec::new();
    // Read through all the items counted while only the first file existed.
    for _ in 0..tasks_in_first_file {
        removed.push(queue.remove().expect("remove"));
    }

    // Fully read files should have been removed.
    assert!(!segment_files(&data_dir).contains(&first_file));

    removed.push(queue.remove().expect("remove"));
    assert!(queue.is_empty());
    assert_eq!(removed, tasks);
}

#[test]
fn roll_drain_and_delete_across_three_segments() {
    let dir = tempdir().expect("tempdir");
    let data_dir = dir.path().join("queue");
    let queue = open_queue(&data_dir);

    for value in 0u8..24 {
        queue.add(&vec![value]).expect("add");
        if value == 9 {
            assert_eq!(segment_files(&data_dir).len(), 1);
        }
        if value == 10 {
            // The add that exceeded the roll size opened a second file.
            assert_eq!(segment_files(&data_dir).len(), 2);
        }
    }
    assert_eq!(queue.len(), 24);
    assert_eq!(segment_files(&data_dir).len(), 3);
    let first_file = segment_files(&data_dir)[0].clone();

    let mut removed: Vec<Vec<u8>> = Vec::new();
    for _ in 0..10 {
        removed.push(queue.remove().expect("remove"));
    }
    // The drained first segment is gone even though later ones remain.
    assert!(!first_file.exists());
    assert_eq!(segment_files(&data_dir).len(), 2);

    for _ in 0..14 {
        removed.push(queue.remove().expect("remove"));
    }
    assert!(queue.is_empty());
    let expected: Vec<Vec<u8>> = (0u8..24).map(|value| vec![value]).collect();
    assert_eq!(removed, expected);

    // Only the (fully drained) tail survives, ready for future appends.
    assert_eq!(segment_files(&data_dir).len(), 1);
    queue.add(&vec![42]).expect("add");
    assert_eq!(queue.remove().expect("remove"), vec![42]);
}
