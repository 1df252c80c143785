use anyhow::bail;

/// How Windows launched us. The shell passes `/s` to run the saver, `/p <hwnd>`
/// to render into the settings-dialog preview pane, and `/c` (or no arguments
/// at all) to show the configure dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    Run,
    /// Raw window handle of the preview pane we must embed into.
    Preview(isize),
    Configure,
}

pub fn parse(args: &[String]) -> anyhow::Result<LaunchMode> {
    let Some(first) = args.first() else {
        return Ok(LaunchMode::Configure);
    };

    let trimmed = first.trim_start_matches(['/', '-']);
    let (flag, inline) = match trimmed.split_once(':') {
        Some((flag, rest)) => (flag, Some(rest)),
        None => (trimmed, None),
    };

    match flag.to_ascii_lowercase().as_str() {
        "s" => Ok(LaunchMode::Run),
        // `/c:<hwnd>` hands us the settings dialog's handle; the configure
        // dialog is a free-standing window, so the handle is ignored.
        "c" => Ok(LaunchMode::Configure),
        "p" => {
            let handle = inline.or_else(|| args.get(1).map(String::as_str));
            let Some(handle) = handle else {
                bail!("preview mode requires a parent window handle");
            };
            let hwnd: isize = handle
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid preview window handle: {handle:?}"))?;
            Ok(LaunchMode::Preview(hwnd))
        }
        other => bail!("unrecognized argument: {other:?}"),
    }
}
