use std::process::ExitCode;

fn main() -> ExitCode {
    kodi_voice_cli::run()
}
