//! WebSocket-based live reload.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Messages sent to connected browsers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// Connection established
    Connected,

    /// Site was rebuilt, reload the page
    Reload,

    /// Rebuild failed; the previous build is still being served
    BuildFailed {
        /// Error report
        message: String,
    },
}

/// Hub for broadcasting reload messages to all connected clients.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    /// Create a new reload hub.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: ReloadMessage) {
        // no receivers is fine
        let _ = self.sender.send(msg);
    }

    /// Subscribe to reload messages.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    /// Get the number of connected clients.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate the client-side live reload script.
///
/// The socket URL is derived from the page location, so the script works on
/// whatever address the server is bound to.
pub fn reload_client_script(socket_path: &str) -> String {
    format!(
        r#"
(function() {{
  'use strict';

  const url = (location.protocol === 'https:' ? 'wss://' : 'ws://') + location.host + '{}';
  let attempts = 0;

  function showError(message) {{
    let overlay = document.getElementById('pukidocs-build-error');
    if (!overlay) {{
      overlay = document.createElement('pre');
      overlay.id = 'pukidocs-build-error';
      overlay.style.cssText = 'position:fixed;left:0;right:0;bottom:0;max-height:40vh;overflow:auto;' +
        'margin:0;padding:1rem;background:#2b1111;color:#ffb4b4;font-size:0.8rem;z-index:1000;';
      document.body.appendChild(overlay);
    }}
    overlay.textContent = message;
  }}

  function connect() {{
    const ws = new WebSocket(url);

    ws.onopen = function() {{
      if (attempts > 0) {{
        location.reload();
        return;
      }}
      console.log('[livereload] Connected');
    }};

    ws.onmessage = function(event) {{
      const msg = JSON.parse(event.data);
      switch (msg.type) {{
        case 'reload':
          location.reload();
          break;
        case 'build_failed':
          console.error('[livereload] Build failed');
          showError(msg.message);
          break;
      }}
    }};

    ws.onclose = function() {{
      if (attempts < 30) {{
        attempts++;
        setTimeout(connect, 1000);
      }}
    }};
  }}

  connect();
}})();
"#,
        socket_path
    )
}
