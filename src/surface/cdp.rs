//! Chrome DevTools Protocol surface.
//!
//! Attaches to a Chrome instance that is already running with remote
//! debugging enabled, picks the first page target, and reads and writes
//! fields by evaluating small scripts in that page. Everything is blocking:
//! one request goes out, and frames are read until its response comes back.

use std::net::TcpStream;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, trace};
use tungstenite::{Message, WebSocket, stream::MaybeTlsStream};

use super::{LiveSurface, Result, SurfaceError};

/// CDP request message.
#[derive(Debug, Serialize)]
struct CdpRequest<'a> {
    id: u64,
    method: &'a str,
    params: Value,
}

/// CDP response or event message.
#[derive(Debug, Deserialize)]
struct CdpResponse {
    id: Option<u64>,
    result: Option<Value>,
    error: Option<CdpErrorBody>,
}

#[derive(Debug, Deserialize)]
struct CdpErrorBody {
    code: i64,
    message: String,
}

/// Target entry from the `/json/list` endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(rename = "type")]
    page_type: String,
    url: String,
    web_socket_debugger_url: Option<String>,
}

/// What the lookup script returns.
#[derive(Debug, Deserialize)]
struct Lookup {
    found: bool,
    value: Option<String>,
}

/// A page in a running Chrome, driven over CDP.
pub struct CdpSurface {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
    next_id: u64,
}

impl CdpSurface {
    /// Connect to the first page target at `address` (e.g. `127.0.0.1:9222`).
    pub fn connect(address: &str) -> Result<Self> {
        let base = address
            .trim_start_matches("http://")
            .trim_end_matches('/');
        let endpoint = format!("http://{base}/json/list");
        debug!(%endpoint, "discovering page targets");

        let pages: Vec<PageInfo> = reqwest::blocking::get(&endpoint)
            .map_err(|e| SurfaceError::Unavailable(format!("{base}: {e}")))?
            .json()?;

        let page = pages
            .into_iter()
            .find(|p| p.page_type == "page" && p.web_socket_debugger_url.is_some())
            .ok_or_else(|| SurfaceError::NoPage(base.to_string()))?;
        debug!(url = %page.url, "attaching to page");

        let ws_url = page
            .web_socket_debugger_url
            .ok_or_else(|| SurfaceError::NoPage(base.to_string()))?;
        let (socket, _) = tungstenite::connect(ws_url.as_str())?;

        Ok(Self { socket, next_id: 1 })
    }

    /// Text content of the first element matching a CSS selector.
    pub fn text_of(&mut self, selector: &str) -> Result<Option<String>> {
        let value = self.evaluate(&text_script(selector))?;
        Ok(value.as_str().map(String::from))
    }

    /// Send a CDP command and wait for its response.
    ///
    /// Events and responses to other ids are discarded.
    fn call(&mut self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let request = serde_json::to_string(&CdpRequest { id, method, params })?;
        trace!(%request, "cdp send");
        self.socket.send(Message::text(request))?;

        loop {
            match self.socket.read()? {
                Message::Text(text) => {
                    let response: CdpResponse = serde_json::from_str(text.as_str())?;
                    if response.id != Some(id) {
                        continue;
                    }
                    if let Some(error) = response.error {
                        return Err(SurfaceError::Protocol {
                            code: error.code,
                            message: error.message,
                        });
                    }
                    return Ok(response.result.unwrap_or(Value::Null));
                }
                Message::Close(_) => {
                    return Err(SurfaceError::WebSocket("connection closed".to_string()));
                }
                _ => {}
            }
        }
    }

    /// Evaluate a script in the page and return its value.
    fn evaluate(&mut self, expression: &str) -> Result<Value> {
        let result = self.call(
            "Runtime.evaluate",
            json!({
                "expression": expression,
                "returnByValue": true,
            }),
        )?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["exception"]["description"]
                .as_str()
                .or_else(|| exception["text"].as_str())
                .unwrap_or("unknown error");
            return Err(SurfaceError::JavaScript(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }

    fn write(&mut self, name: &str, value: &str, mode: WriteMode) -> Result<()> {
        match self.evaluate(&write_script(name, value, mode))? {
            Value::Bool(true) => Ok(()),
            _ => Err(SurfaceError::FieldNotFound(name.to_string())),
        }
    }
}

impl LiveSurface for CdpSurface {
    fn lookup(&mut self, name: &str) -> Result<Option<String>> {
        let value = self.evaluate(&lookup_script(name))?;
        let lookup: Lookup = serde_json::from_value(value)?;
        if !lookup.found {
            return Ok(None);
        }
        Ok(Some(lookup.value.unwrap_or_default()))
    }

    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        self.write(name, value, WriteMode::Replace)
    }

    fn append(&mut self, name: &str, value: &str) -> Result<()> {
        self.write(name, value, WriteMode::Append)
    }

    fn clear(&mut self, name: &str) -> Result<()> {
        self.write(name, "", WriteMode::Replace)
    }
}

#[derive(Debug, Clone, Copy)]
enum WriteMode {
    Replace,
    Append,
}

/// Quote a string as a JavaScript literal. JSON strings are valid JS.
fn js_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn lookup_script(name: &str) -> String {
    format!(
        "(() => {{ \
           const el = document.getElementsByName({name})[0]; \
           if (!el) return {{ found: false, value: null }}; \
           const value = el.value ?? el.getAttribute('value') ?? ''; \
           return {{ found: true, value: String(value) }}; \
         }})()",
        name = js_string(name),
    )
}

/// Assigns through the prototype's value setter and fires `input`/`change`
/// so framework-controlled inputs pick up the new value.
fn write_script(name: &str, value: &str, mode: WriteMode) -> String {
    let append = matches!(mode, WriteMode::Append);
    format!(
        "(() => {{ \
           const el = document.getElementsByName({name})[0]; \
           if (!el) return false; \
           const next = {append} ? (el.value ?? '') + {value} : {value}; \
           const setter = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value')?.set; \
           if (setter) {{ setter.call(el, next); }} else {{ el.value = next; }} \
           el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
           el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
           return true; \
         }})()",
        name = js_string(name),
        value = js_string(value),
    )
}

fn text_script(selector: &str) -> String {
    format!(
        "(() => {{ \
           const el = document.querySelector({selector}); \
           return el ? el.textContent : null; \
         }})()",
        selector = js_string(selector),
    )
}
