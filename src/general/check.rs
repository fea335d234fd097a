use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::general::transpose::TrackReport;

fn print_line(stream: &mut StandardStream, color: Option<Color>, line: &str) {
    let _ = stream.set_color(ColorSpec::new().set_fg(color).set_intense(true));
    let _ = writeln!(stream, "{}", line);
    let _ = stream.reset();
}

/// Plain status line such as the input and output names.
pub fn print_info(choice: ColorChoice, line: &str) {
    let mut stdout = StandardStream::stdout(choice);
    let _ = writeln!(&mut stdout, "{}", line);
}

/// Green for a fully rewritten track, yellow for one that stopped early.
pub fn print_track_report(choice: ColorChoice, report: &TrackReport) {
    let mut stdout = StandardStream::stdout(choice);
    match &report.halted {
        None => print_line(
            &mut stdout,
            Some(Color::Green),
            &format!("Track {} reformatted", report.index + 1),
        ),
        Some(err) => print_line(
            &mut stdout,
            Some(Color::Yellow),
            &format!("Track {} halted: {}", report.index + 1, err),
        ),
    }
}

pub fn print_finished(choice: ColorChoice, output: &str) {
    let mut stdout = StandardStream::stdout(choice);
    print_line(&mut stdout, Some(Color::Green), &format!("Wrote {}", output));
}

pub fn print_error(choice: ColorChoice, message: &str) {
    let mut stderr = StandardStream::stderr(choice);
    print_line(&mut stderr, Some(Color::Red), &format!("Error: {}", message));
}
