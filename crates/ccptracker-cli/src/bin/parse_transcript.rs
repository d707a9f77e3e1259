//! Stop-hook helper: `ccptracker-parse-transcript [transcript_path]`
//!
//! Always prints exactly one JSON line and exits 0.

fn main() {
    ccptracker::init_tracing();
    println!("{}", ccptracker::transcript_summary_line(std::env::args_os()));
}
