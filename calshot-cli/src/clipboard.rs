use std::io::{IsTerminal, Write};

use calshot_core::{CalShotError, Clipboard, error::CalShotResult};

/// Writes PNG bytes to stdout so they can be piped into a system clipboard
/// tool (`wl-copy`, `xclip -selection clipboard -t image/png`, `pbcopy`).
pub struct StdoutClipboard;

impl Clipboard for StdoutClipboard {
    fn write_png(&self, png_data: &[u8]) -> CalShotResult<()> {
        let stdout = std::io::stdout();
        if stdout.is_terminal() {
            return Err(CalShotError::Clipboard(
                "stdout is a terminal; pipe it into a clipboard tool such as wl-copy or pbcopy".into(),
            ));
        }

        let mut out = stdout.lock();
        out.write_all(png_data)
            .and_then(|_| out.flush())
            .map_err(|e| CalShotError::Clipboard(e.to_string()))
    }
}
