//! WASM bindings for the document editor
//!
//! All document state lives in Rust inside an `EditorSession`. JavaScript
//! renders pages with pdf.js, pushes each page's pixels and text runs into
//! the session, and forwards pointer and keyboard events. The canvas
//! overlay is drawn from session frames.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { EditorSession, initLogging } from './pkg/docedit_wasm.js';
//!
//! await init();
//! initLogging("info");
//!
//! const session = new EditorSession();
//! const ticket = session.beginLoad();
//! for (const page of pages) {
//!     const scale = session.scaleFor(page.width, page.height);
//!     const { rgba, width, height } = await renderWithPdfJs(page, scale);
//!     const runs = (await page.getTextContent()).items;
//!     session.pushPage(ticket, page.width, page.height, width, height, rgba, JSON.stringify(runs));
//! }
//! session.finishLoad(ticket);
//!
//! canvas.onmousedown = (e) => session.pointerDown(e.offsetX, e.offsetY, e.ctrlKey || e.metaKey);
//! document.onkeydown = (e) => session.handleKey(e.key, e.ctrlKey || e.metaKey) && e.preventDefault();
//! session.render(0, ctx);
//! ```

pub mod logging;
pub mod overlay;
pub mod session;

use wasm_bindgen::prelude::*;

pub use overlay::CanvasOverlay;
pub use session::EditorSession;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
