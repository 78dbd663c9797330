/*! Runtime support shared by the JIT and the interpreter.
 *
 * Generated code never calls the C `printf` directly: Cranelift has no variadic calls, so each
 * print packs its arguments into 8-byte slots and calls `vsl_printf`. Output goes to stdout, or
 * into a per-thread buffer while `capture_output` is active.
 */

use std::cell::{Cell, RefCell};
use std::ffi::{c_char, CStr};
use std::io::Write;

thread_local! {
    static CAPTURE: RefCell<Option<String>> = const { RefCell::new(None) };
    static LINE_OPEN: Cell<bool> = const { Cell::new(false) };
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormatArg<'a> {
    Number(f64),
    Text(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Number { precision: usize },
    Text,
}

/// Conversions consuming an argument, in order. `%%` and unknown directives consume nothing.
pub fn conversions(format: &str) -> Vec<Conversion> {
    let mut out = Vec::new();
    scan(format, |piece| {
        if let Piece::Conversion(c) = piece {
            out.push(c);
        }
    });
    out
}

/// C-compatible rendering of `%s`, `%f`, `%.Nf` and `%%`. Missing arguments render as nothing;
/// an argument of the wrong kind is rendered as best it can be.
pub fn format_printf(format: &str, args: &[FormatArg<'_>]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut args = args.iter();
    scan(format, |piece| match piece {
        Piece::Literal(text) => out.push_str(text),
        Piece::Conversion(Conversion::Number { precision }) => match args.next() {
            Some(FormatArg::Number(n)) => out.push_str(&format_float(*n, precision)),
            Some(FormatArg::Text(t)) => out.push_str(t),
            None => {}
        },
        Piece::Conversion(Conversion::Text) => match args.next() {
            Some(FormatArg::Text(t)) => out.push_str(t),
            Some(FormatArg::Number(n)) => out.push_str(&format_float(*n, 6)),
            None => {}
        },
    });
    out
}

/// `%.Nf` as C prints it: lowercase `inf`/`nan`, sign kept on negative zero.
pub fn format_float(value: f64, precision: usize) -> String {
    if value.is_nan() {
        if value.is_sign_negative() {
            "-nan".to_string()
        } else {
            "nan".to_string()
        }
    } else if value.is_infinite() {
        if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        }
    } else {
        format!("{:.*}", precision, value)
    }
}

enum Piece<'a> {
    Literal(&'a str),
    Conversion(Conversion),
}

fn scan<'a>(format: &'a str, mut emit: impl FnMut(Piece<'a>)) {
    let mut rest = format;
    while let Some(pos) = rest.find('%') {
        if pos > 0 {
            emit(Piece::Literal(&rest[..pos]));
        }
        let directive = &rest[pos + 1..];

        if let Some(after) = directive.strip_prefix('%') {
            emit(Piece::Literal("%"));
            rest = after;
            continue;
        }
        if let Some(after) = directive.strip_prefix('s') {
            emit(Piece::Conversion(Conversion::Text));
            rest = after;
            continue;
        }

        let (precision, after_precision) = match directive.strip_prefix('.') {
            Some(digits) => {
                let len = digits.bytes().take_while(u8::is_ascii_digit).count();
                (digits[..len].parse().unwrap_or(0), &digits[len..])
            }
            None => (6, directive),
        };
        match after_precision.strip_prefix('f') {
            Some(after) => {
                emit(Piece::Conversion(Conversion::Number { precision }));
                rest = after;
            }
            None => {
                emit(Piece::Literal("%"));
                rest = directive;
            }
        }
    }
    if !rest.is_empty() {
        emit(Piece::Literal(rest));
    }
}

pub fn write_output(text: &str) {
    let captured = CAPTURE.with(|capture| match capture.borrow_mut().as_mut() {
        Some(buffer) => {
            buffer.push_str(text);
            true
        }
        None => false,
    });
    if !captured && !text.is_empty() {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
        LINE_OPEN.with(|open| open.set(!text.ends_with('\n')));
    }
}

/// True when the last text this thread wrote to stdout did not end with a newline.
pub fn line_open() -> bool {
    LINE_OPEN.with(Cell::get)
}

/// Runs `f`, collecting everything printed through the runtime on this thread.
pub fn capture_output<T>(f: impl FnOnce() -> T) -> (T, String) {
    let previous = CAPTURE.with(|capture| capture.replace(Some(String::new())));
    let result = f();
    let captured = CAPTURE.with(|capture| capture.replace(previous));
    (result, captured.unwrap_or_default())
}

/// Entry point called by JIT-compiled and linked code for every print statement.
///
/// # Safety
///
/// `format` must point to a NUL-terminated string. `args` must point to `count` 8-byte slots, one
/// per conversion in the format, holding `f64` bits for `%f` and a pointer to a NUL-terminated
/// string for `%s`.
pub unsafe extern "C" fn vsl_printf(format: *const c_char, args: *const u64, count: usize) -> i32 {
    if format.is_null() {
        return -1;
    }
    let format = CStr::from_ptr(format).to_string_lossy();
    let slots: &[u64] = if args.is_null() || count == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(args, count)
    };

    let texts: Vec<String> = conversions(&format)
        .iter()
        .zip(slots)
        .filter(|(conv, _)| matches!(conv, Conversion::Text))
        .map(|(_, slot)| {
            let ptr = *slot as usize as *const c_char;
            if ptr.is_null() {
                String::from("(null)")
            } else {
                CStr::from_ptr(ptr).to_string_lossy().into_owned()
            }
        })
        .collect();

    let mut texts = texts.iter();
    let format_args: Vec<FormatArg<'_>> = conversions(&format)
        .iter()
        .zip(slots)
        .filter_map(|(conv, slot)| match conv {
            Conversion::Number { .. } => Some(FormatArg::Number(f64::from_bits(*slot))),
            Conversion::Text => texts.next().map(|t| FormatArg::Text(t.as_str())),
        })
        .collect();

    let rendered = format_printf(&format, &format_args);
    write_output(&rendered);
    i32::try_from(rendered.len()).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_open_tracks_stdout_only() {
        write_output("partial ");
        assert!(line_open());
        let ((), out) = capture_output(|| write_output("captured\n"));
        assert_eq!(out, "captured\n");
        assert!(line_open());
        write_output("line\n");
        assert!(!line_open());
    }

    #[test]
    fn test_number_and_text_conversions() {
        let out = format_printf(
            "%s%.1f%s",
            &[
                FormatArg::Text("x = "),
                FormatArg::Number(5.0),
                FormatArg::Text("\n"),
            ],
        );
        assert_eq!(out, "x = 5.0\n");
    }

    #[test]
    fn test_percent_escape_and_default_precision() {
        assert_eq!(format_printf("100%% %f", &[FormatArg::Number(0.5)]), "100% 0.500000");
    }

    #[test]
    fn test_special_floats_follow_c() {
        assert_eq!(format_float(f64::INFINITY, 1), "inf");
        assert_eq!(format_float(f64::NEG_INFINITY, 1), "-inf");
        assert_eq!(format_float(f64::NAN, 1), "nan");
        assert_eq!(format_float(-0.0, 1), "-0.0");
    }

    #[test]
    fn test_conversions_skip_literals() {
        assert_eq!(
            conversions("a %s b %.1f %% %q"),
            vec![Conversion::Text, Conversion::Number { precision: 1 }]
        );
    }

    #[test]
    fn test_capture_output_is_scoped() {
        let ((), outer) = capture_output(|| {
            write_output("a");
            let ((), inner) = capture_output(|| write_output("b"));
            assert_eq!(inner, "b");
            write_output("c");
        });
        assert_eq!(outer, "ac");
    }

    #[test]
    fn test_vsl_printf_decodes_packed_slots() {
        let format = std::ffi::CString::new("%s=%.1f").unwrap();
        let name = std::ffi::CString::new("x").unwrap();
        let slots = [name.as_ptr() as usize as u64, 2.5f64.to_bits()];
        let (written, out) =
            capture_output(|| unsafe { vsl_printf(format.as_ptr(), slots.as_ptr(), slots.len()) });
        assert_eq!(out, "x=2.5");
        assert_eq!(written, 5);
    }
}
