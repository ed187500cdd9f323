#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use tdms_csv::tdms::TdmsFile;

fuzz_target!(|data: &[u8]| {
    // Indexing arbitrary bytes must fail cleanly, never panic
    let Ok(file) = TdmsFile::from_reader(Cursor::new(data)) else {
        return;
    };

    // Reading every channel must also fail cleanly. Raw reads are bounded by
    // the input length, whatever lengths the metadata declares; the chunk
    // limit only bounds run time on channels that claim billions of values
    for group in file.groups() {
        for channel in group.channels() {
            for chunk in channel.read_chunks(&file, 64).take(1_000) {
                if chunk.is_err() {
                    break;
                }
            }
        }
    }
});
