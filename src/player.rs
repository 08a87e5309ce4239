use anyhow::{Context, Result, anyhow};
use std::process::Stdio;
use tokio::{
  io::AsyncBufReadExt,
  io::BufReader as TokioBufReader,
  process::{Child as TokioChild, Command},
  sync::mpsc,
  task::JoinHandle,
};
use tracing::{info, warn};

use crate::model::Video;

/// External `mpv` process driving playback of a record's stream URL.
#[derive(Default)]
pub struct MediaPlayer {
  pub(crate) current_process: Option<TokioChild>,
  pub current: Option<Video>,
  mpv_monitor_handle: Option<JoinHandle<()>>,
  mpv_status_rx: Option<mpsc::Receiver<String>>,
  last_mpv_status: Option<String>,
  ipc_socket_path: Option<String>,
  pub paused: bool,
}

fn mpv_args(url: &str, socket_path: &str) -> Vec<String> {
  vec![
    "--force-window=yes".to_string(),
    "--term-status-msg=Time: ${time-pos/full} / ${duration/full} | ${pause} ${percent-pos}%".to_string(),
    format!("--input-ipc-server={}", socket_path),
    url.to_string(),
  ]
}

impl MediaPlayer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_playing(&self) -> bool {
    self.current_process.is_some()
  }

  pub fn check_mpv_status(&mut self) {
    if let Some(rx) = &mut self.mpv_status_rx {
      while let Ok(status) = rx.try_recv() {
        self.last_mpv_status = Some(status);
      }
    }
  }

  pub fn last_mpv_status(&self) -> Option<&str> {
    self.last_mpv_status.as_deref()
  }

  pub async fn play(&mut self, video: &Video) -> Result<()> {
    self.stop().await.context("Failed to stop previous playback")?;
    self.paused = false;

    let socket_path = std::env::temp_dir().join(format!("streamfree-mpv-{}.sock", std::process::id()));
    let socket_path_str = socket_path.to_str().context("Temp dir path is not valid UTF-8")?.to_string();
    // Stale socket from a previous crash.
    let _ = std::fs::remove_file(&socket_path);

    let mut cmd = Command::new("mpv");
    cmd.args(mpv_args(&video.url, &socket_path_str));
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    // Undrained piped stderr would eventually block mpv.
    cmd.stderr(Stdio::null());

    let mut child = cmd.spawn().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("mpv not found. Install it with: brew install mpv (macOS) or apt install mpv (Linux)")
      } else {
        anyhow!(e).context("Failed to spawn mpv process")
      }
    })?;

    let stdout = child.stdout.take().context("Failed to get mpv stdout")?;
    let (tx, rx) = mpsc::channel::<String>(10);
    self.mpv_status_rx = Some(rx);

    let monitor_handle = tokio::spawn(async move {
      let reader = TokioBufReader::new(stdout);
      let mut lines = reader.lines();
      while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
          break;
        }
      }
    });

    info!(id = %video.id, url = %video.url, "player: started mpv");
    self.current_process = Some(child);
    self.current = Some(video.clone());
    self.mpv_monitor_handle = Some(monitor_handle);
    self.ipc_socket_path = Some(socket_path_str);
    Ok(())
  }

  pub async fn toggle_pause(&mut self) -> Result<()> {
    let Some(ref socket_path) = self.ipc_socket_path else {
      return Ok(());
    };
    let stream = tokio::net::UnixStream::connect(socket_path).await.context("Failed to connect to mpv IPC socket")?;
    stream.writable().await.context("mpv IPC socket not writable")?;
    let cmd = b"{\"command\":[\"cycle\",\"pause\"]}\n";
    let written = stream.try_write(cmd).context("Failed to send pause command to mpv")?;
    if written < cmd.len() {
      return Err(anyhow!("Partial write to mpv IPC socket: wrote {} of {} bytes", written, cmd.len()));
    }
    self.paused = !self.paused;
    Ok(())
  }

  pub async fn stop(&mut self) -> Result<()> {
    if let Some(handle) = self.mpv_monitor_handle.take() {
      handle.abort();
      let _ = handle.await;
    }
    self.mpv_status_rx = None;
    self.last_mpv_status = None;

    if let Some(mut child) = self.current_process.take() {
      if let Err(e) = child.kill().await {
        warn!(err = %e, "player: mpv already gone");
      }
      let _ = child.wait().await;
    }

    self.current = None;
    self.paused = false;

    if let Some(path) = self.ipc_socket_path.take() {
      let _ = std::fs::remove_file(&path);
    }
    Ok(())
  }
}
