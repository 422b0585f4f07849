//! A spreadsheet host backed by an external renderer program.
//!
//! Sheets are listed by reading the workbook directly. Each render spawns the
//! configured program once with placeholders expanded:
//!
//! | Placeholder    | Value                              |
//! |----------------|------------------------------------|
//! | `{input}`      | path of the workbook               |
//! | `{sheet}`      | 1-based sheet index                |
//! | `{sheet_name}` | sheet name                         |
//! | `{output}`     | path the render must be written to |
//! | `{format}`     | output extension, e.g. `pdf`       |

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::{Config, RendererConfig};
use crate::convert::host::{
    ExtendedFaultInfo, HostFault, HostLauncher, HostResult, RenderFormat, SpreadsheetHost,
    WorkbookId,
};
use crate::convert::workbook::sheet_names;

/// The renderer could not be started.
pub const FAULT_SPAWN: i64 = -1;
/// The renderer ran past its timeout and was killed.
pub const FAULT_TIMEOUT: i64 = -2;
/// The renderer succeeded but wrote no output.
pub const FAULT_MISSING_OUTPUT: i64 = -3;
/// The workbook could not be read.
pub const FAULT_WORKBOOK: i64 = -4;
/// The workbook handle or sheet index is unknown.
pub const FAULT_NOT_FOUND: i64 = -5;
/// The renderer was terminated by a signal.
pub const FAULT_SIGNALLED: i64 = -6;

const DEFAULT_ARGS: [&str; 3] = ["{input}", "{sheet}", "{output}"];
const POLL_INTERVAL: Duration = Duration::from_millis(25);
const STDERR_GRACE: Duration = Duration::from_millis(250);

/// Launcher for [`CommandHost`].
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandRenderer {
    /// Create a renderer spawning `program` with the `args` template.
    ///
    /// An empty template means `{input} {sheet} {output}`.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    /// Bound each render call.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the renderer named in `config`, if any.
    pub fn from_config(config: &Config) -> Option<Self> {
        config.renderer.as_ref().map(|RendererConfig { program, args }| {
            Self::new(program.clone(), args.clone()).with_timeout(config.host_timeout())
        })
    }

    /// Program this renderer spawns.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn expand_args(&self, vars: &RenderVars<'_>) -> Vec<String> {
        let template: Vec<&str> = if self.args.is_empty() {
            DEFAULT_ARGS.to_vec()
        } else {
            self.args.iter().map(String::as_str).collect()
        };

        template.into_iter().map(|arg| vars.expand(arg)).collect()
    }

    fn fault(&self, code: i64, message: impl Into<String>, detail: Option<String>) -> HostFault {
        HostFault::new(code, message).with_extended(ExtendedFaultInfo {
            source: Some(self.program.display().to_string()),
            description: detail,
            help_file: None,
            help_id: None,
        })
    }
}

impl HostLauncher for CommandRenderer {
    type Host = CommandHost;

    fn launch(&self) -> HostResult<CommandHost> {
        tracing::debug!(program = %self.program.display(), "command renderer ready");

        Ok(CommandHost {
            renderer: self.clone(),
            workbooks: HashMap::new(),
            next_id: 1,
            visible: true,
            alerts_suppressed: false,
        })
    }
}

struct RenderVars<'a> {
    input: &'a Path,
    sheet: usize,
    sheet_name: &'a str,
    output: &'a Path,
    format: RenderFormat,
}

impl RenderVars<'_> {
    fn lookup(&self, name: &str) -> Option<String> {
        match name {
            "input" => Some(self.input.to_string_lossy().into_owned()),
            "sheet" => Some(self.sheet.to_string()),
            "sheet_name" => Some(self.sheet_name.to_string()),
            "output" => Some(self.output.to_string_lossy().into_owned()),
            "format" => Some(self.format.extension().to_string()),
            _ => None,
        }
    }

    /// Substitute placeholders in one pass. Substituted values are never
    /// scanned again, and unknown `{...}` text is kept as written.
    fn expand(&self, template: &str) -> String {
        let mut expanded = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            expanded.push_str(&rest[..open]);
            let tail = &rest[open..];

            let placeholder = tail
                .find('}')
                .and_then(|close| self.lookup(&tail[1..close]).map(|value| (close, value)));

            match placeholder {
                Some((close, value)) => {
                    expanded.push_str(&value);
                    rest = &tail[close + 1..];
                }
                None => {
                    expanded.push('{');
                    rest = &tail[1..];
                }
            }
        }

        expanded.push_str(rest);
        expanded
    }
}

struct OpenWorkbook {
    path: PathBuf,
    sheets: Vec<String>,
}

/// Host that renders sheets by spawning an external program.
pub struct CommandHost {
    renderer: CommandRenderer,
    workbooks: HashMap<WorkbookId, OpenWorkbook>,
    next_id: u64,
    visible: bool,
    alerts_suppressed: bool,
}

impl CommandHost {
    /// Whether the host was last asked to be visible.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether alert prompts are currently suppressed.
    pub fn alerts_suppressed(&self) -> bool {
        self.alerts_suppressed
    }

    /// Number of workbooks currently open.
    pub fn open_workbooks(&self) -> usize {
        self.workbooks.len()
    }

    fn workbook(&self, workbook: WorkbookId) -> HostResult<&OpenWorkbook> {
        self.workbooks.get(&workbook).ok_or_else(|| {
            self.renderer
                .fault(FAULT_NOT_FOUND, format!("Unknown workbook {workbook:?}"), None)
        })
    }

    fn run(&self, args: Vec<String>, output: &Path) -> HostResult<()> {
        let renderer = &self.renderer;

        let mut command = Command::new(&renderer.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command
            .spawn()
            .map_err(|e| renderer.fault(FAULT_SPAWN, "Failed to start renderer", Some(e.to_string())))?;
        let stderr = StderrLines::spawn(&mut child);

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    kill_process_group(&mut child);
                    return Err(renderer.fault(
                        FAULT_SPAWN,
                        "Failed to wait for renderer",
                        Some(e.to_string()),
                    ));
                }
            }

            if let Some(timeout) = renderer.timeout
                && started.elapsed() >= timeout
            {
                kill_process_group(&mut child);
                tracing::warn!(program = %renderer.program.display(), ?timeout, "renderer timed out");
                return Err(renderer.fault(
                    FAULT_TIMEOUT,
                    format!("Renderer timed out after {}s", timeout.as_secs_f64()),
                    stderr.collect(),
                ));
            }

            thread::sleep(POLL_INTERVAL);
        };

        let stderr = stderr.collect();

        if !status.success() {
            let code = status.code().map_or(FAULT_SIGNALLED, i64::from);
            return Err(renderer.fault(code, format!("Renderer failed ({status})"), stderr));
        }

        if !output.is_file() {
            return Err(renderer.fault(
                FAULT_MISSING_OUTPUT,
                format!("Renderer wrote no output to {}", output.display()),
                stderr,
            ));
        }

        Ok(())
    }
}

/// Kill the renderer and everything it spawned, then reap it.
fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pid) = libc::pid_t::try_from(child.id()) {
            // The renderer leads its own group; a negative pid signals all of it.
            unsafe {
                libc::kill(-pid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

/// Renderer stderr, read line by line on a helper thread.
///
/// Helpers forked by the renderer inherit the pipe and may hold it open long
/// after the renderer exits, so collection waits at most [`STDERR_GRACE`].
struct StderrLines {
    lines: Option<mpsc::Receiver<String>>,
}

impl StderrLines {
    fn spawn(child: &mut Child) -> Self {
        let lines = child.stderr.take().map(|stderr| {
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
            rx
        });
        Self { lines }
    }

    fn collect(self) -> Option<String> {
        let rx = self.lines?;
        let deadline = Instant::now() + STDERR_GRACE;
        let mut text = Vec::new();

        while let Ok(line) = rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            text.push(line);
        }

        let text = text.join("\n");
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

impl SpreadsheetHost for CommandHost {
    fn set_visible(&mut self, visible: bool) -> HostResult<()> {
        self.visible = visible;
        Ok(())
    }

    fn set_alerts_suppressed(&mut self, suppressed: bool) -> HostResult<()> {
        self.alerts_suppressed = suppressed;
        Ok(())
    }

    fn open_workbook(&mut self, path: &Path) -> HostResult<WorkbookId> {
        let sheets = sheet_names(path).map_err(|e| {
            self.renderer.fault(
                FAULT_WORKBOOK,
                format!("Cannot open workbook {}", path.display()),
                Some(e.to_string()),
            )
        })?;

        let id = WorkbookId(self.next_id);
        self.next_id += 1;
        self.workbooks.insert(
            id,
            OpenWorkbook {
                path: path.to_path_buf(),
                sheets,
            },
        );

        Ok(id)
    }

    fn sheet_count(&mut self, workbook: WorkbookId) -> HostResult<usize> {
        Ok(self.workbook(workbook)?.sheets.len())
    }

    fn sheet_name(&mut self, workbook: WorkbookId, index: usize) -> HostResult<String> {
        let open = self.workbook(workbook)?;
        index
            .checked_sub(1)
            .and_then(|i| open.sheets.get(i))
            .cloned()
            .ok_or_else(|| {
                self.renderer
                    .fault(FAULT_NOT_FOUND, format!("No sheet at index {index}"), None)
            })
    }

    fn render_sheet(
        &mut self,
        workbook: WorkbookId,
        index: usize,
        output: &Path,
        format: RenderFormat,
    ) -> HostResult<()> {
        let sheet_name = self.sheet_name(workbook, index)?;
        let input = self.workbook(workbook)?.path.clone();

        let args = self.renderer.expand_args(&RenderVars {
            input: &input,
            sheet: index,
            sheet_name: &sheet_name,
            output,
            format,
        });

        tracing::debug!(program = %self.renderer.program.display(), ?args, "spawning renderer");
        self.run(args, output)
    }

    fn close_workbook(&mut self, workbook: WorkbookId) -> HostResult<()> {
        self.workbooks.remove(&workbook).map(|_| ()).ok_or_else(|| {
            self.renderer
                .fault(FAULT_NOT_FOUND, format!("Unknown workbook {workbook:?}"), None)
        })
    }

    fn quit(&mut self) -> HostResult<()> {
        self.workbooks.clear();
        Ok(())
    }
}
