#![no_main]
use libfuzzer_sys::fuzz_target;
use vstdio_core::{StreamStore, Whence};

// Interprets the input as a little op script against one read-write handle
// and checks the bounded-cursor and overwrite/append invariants after
// every step.
fuzz_target!(|data: &[u8]| {
    let store = StreamStore::new();
    store.install("f", b"0123456789".to_vec());
    let Ok(mut h) = store.fopen("f", "r+") else {
        return;
    };

    for chunk in data.chunks(3) {
        let [op, a, b] = match chunk {
            [op, a, b] => [*op, *a, *b],
            _ => return,
        };
        let before = store.contents("f").unwrap_or_default();
        let cursor = h.tell().unwrap_or(0);
        match op % 3 {
            0 => {
                let origin = [Whence::Start, Whence::Current, Whence::End][usize::from(a % 3)];
                let offset = i64::from(b as i8);
                let moved = h.seek(origin, offset);
                let after = h.tell().unwrap_or(0);
                if moved.is_err() {
                    assert_eq!(after, cursor);
                }
            }
            1 => {
                let src = vec![a; usize::from(b % 16)];
                let n = h.write(&src).unwrap_or(0);
                let after = store.contents("f").unwrap_or_default();
                assert_eq!(n, src.len());
                assert_eq!(after.len(), before.len().max(cursor + n));
                assert_eq!(&after[cursor..cursor + n], &src[..]);
            }
            _ => {
                let mut dst = vec![0u8; usize::from(a % 32)];
                let n = h.read(&mut dst).unwrap_or(0);
                assert_eq!(&dst[..n], &before[cursor..cursor + n]);
            }
        }
        let len = store.contents("f").map_or(0, |c| c.len());
        assert!(h.tell().unwrap_or(0) <= len);
    }
});
