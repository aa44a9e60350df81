#![no_main]

use libfuzzer_sys::fuzz_target;
use spinlist::cursor::PlaylistCursor;
use spinlist::library;

fuzz_target!(|data: &[u8]| {
    let Some((&shape, ops)) = data.split_first() else {
        return;
    };
    let len = usize::from(shape % 16);
    let paths: Vec<String> = (0..len)
        .map(|idx| {
            if (shape >> (idx % 8)) & 1 == 0 {
                format!("/fuzz/track_{idx}.mp3")
            } else {
                format!("/fuzz/track_{idx}.flac")
            }
        })
        .collect();
    let Ok(mut cursor) = PlaylistCursor::from_paths(&paths) else {
        return;
    };

    for byte in ops {
        let returned = match byte % 3 {
            0 => cursor.advance().ok().map(|path| path.to_path_buf()),
            1 => cursor.rewind().ok().map(|path| path.to_path_buf()),
            _ => {
                cursor.reset();
                None
            }
        };
        assert!(cursor.current_index() <= cursor.count());
        if let Some(path) = returned {
            assert!(library::is_playable(&path));
        }
    }
});
