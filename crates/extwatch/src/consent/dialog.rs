use async_trait::async_trait;
use extwatch_platform::{DialogRequest, show_dialog};
use log::{debug, warn};

use super::{ConsentChannel, ConsentRequest, ConsentResult};

/// Native modal dialog, used when no terminal is attached.
pub struct NativeDialogChannel;

#[async_trait]
impl ConsentChannel for NativeDialogChannel {
    fn name(&self) -> &'static str {
        "native dialog"
    }

    fn is_headless(&self) -> bool {
        true
    }

    async fn request(&self, request: &ConsentRequest) -> ConsentResult {
        let dialog = DialogRequest {
            title: &request.title,
            body: &request.body,
            buttons: &request.options,
            default_button: &request.default_option,
        };
        match show_dialog(&dialog).await {
            Ok(label) => {
                debug!("Dialog returned: {label}");
                ConsentResult::Selected(label)
            }
            Err(error) => ConsentResult::Unavailable(error.to_string()),
        }
    }

    async fn notify(&self, title: &str, body: &str) {
        let buttons = ["OK".to_string()];
        let dialog = DialogRequest {
            title,
            body,
            buttons: &buttons,
            default_button: "OK",
        };
        if let Err(error) = show_dialog(&dialog).await {
            warn!("Could not show notification: {error}");
        }
    }
}
