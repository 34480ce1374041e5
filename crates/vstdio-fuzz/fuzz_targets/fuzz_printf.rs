#![no_main]
use libfuzzer_sys::fuzz_target;
use vstdio_core::FormatArg;
use vstdio_core::stdio::printf::{MAX_FIELD, format_to_buffer, render};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte sizes the snprintf buffer; the rest is the template.
    let (cap, template) = (usize::from(data[0]), &data[1..]);
    let args = [
        FormatArg::Signed(-1),
        FormatArg::Unsigned(u64::MAX),
        FormatArg::Str(b"fuzz"),
        FormatArg::Char(b'z'),
        FormatArg::Float(-0.5),
        FormatArg::Signed(7),
    ];

    let rendered = render(template, &args);
    if let Ok(out) = &rendered {
        let directives = template.iter().filter(|&&b| b == b'%').count();
        assert!(out.len() <= template.len() + directives * (MAX_FIELD * 2 + 64));
    }

    let mut dst = vec![0xEEu8; cap];
    match (format_to_buffer(&mut dst, template, &args), rendered) {
        (Ok(res), Ok(out)) => {
            assert_eq!(res.full_len, out.len());
            assert_eq!(&dst[..res.written], &out[..res.written]);
            if cap > 0 {
                assert_eq!(res.written, out.len().min(cap - 1));
                assert_eq!(dst[res.written], 0);
            }
        }
        (Err(a), Err(b)) => assert_eq!(a, b),
        _ => panic!("buffer and vector rendering disagree"),
    }
});
