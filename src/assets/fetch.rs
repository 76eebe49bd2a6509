use js_sys::Uint8Array;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::Response;

use super::{AssetLoader, FailureCallback, LoadProgress, ProgressCallback, SuccessCallback};

/// Loads assets with the browser `fetch` API, relative to `base`.
#[derive(Debug, Clone, Default)]
pub struct FetchLoader {
    base: String,
}

impl FetchLoader {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    fn url_for(&self, url: &str) -> String {
        if self.base.is_empty() || url.contains("://") {
            url.to_string()
        } else {
            format!(
                "{}/{}",
                self.base.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
    }
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
    let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(describe)?
        .dyn_into()
        .map_err(describe)?;
    if !response.ok() {
        return Err(format!("HTTP {} {}", response.status(), response.status_text()));
    }
    let buffer = JsFuture::from(response.array_buffer().map_err(describe)?)
        .await
        .map_err(describe)?;
    Ok(Uint8Array::new(&buffer).to_vec())
}

fn describe(value: JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}

impl AssetLoader for FetchLoader {
    fn load(
        &self,
        url: &str,
        mut on_success: SuccessCallback,
        mut on_progress: ProgressCallback,
        mut on_failure: FailureCallback,
    ) {
        let url = self.url_for(url);
        spawn_local(async move {
            match fetch_bytes(&url).await {
                Ok(bytes) => {
                    let len = bytes.len() as u64;
                    on_progress(LoadProgress {
                        loaded: len,
                        total: Some(len),
                    });
                    on_success(bytes);
                }
                Err(reason) => on_failure(reason),
            }
        });
    }
}
