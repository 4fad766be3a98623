//! File operations for loading floor-plan images.
//!
//! This module handles the native file dialog, the browser file picker, drag-and-drop
//! and seeded plan images. Every load runs as a background task and reports back over
//! the loader channel.

use super::state::{FloorplanApp, LoadEvent, LoadMessage};
use crate::actions::Action;
#[cfg(target_arch = "wasm32")]
use crate::error::FloorplanError;
use crate::image_load::{load_image, ImageLoad, ImageSource, LoadOrigin};
use crate::types::FloorplanImage;
use eframe::egui;
use std::future::Future;
use std::sync::mpsc::Sender;

impl FloorplanApp {
    /// Handles pending image operations for both native and WASM platforms.
    ///
    /// Applies completed loads from the channel, then starts a picker if one was requested.
    pub fn handle_pending_operations(&mut self, ctx: &egui::Context) {
        if self.loader.repaint.is_none() {
            self.loader.repaint = Some(ctx.clone());
        }

        while let Ok(message) = self.loader.receiver.try_recv() {
            self.apply_load_message(ctx, message);
        }

        if std::mem::take(&mut self.loader.pick_requested) {
            self.start_picker();
        }
    }

    /// Applies one message from a background load.
    pub fn apply_load_message(&mut self, ctx: &egui::Context, message: LoadMessage) {
        if message.request != self.loader.request {
            log::debug!("ignoring result of superseded image load #{}", message.request);
            return;
        }
        match message.event {
            LoadEvent::Started(name) => {
                self.loader.load = ImageLoad::Loading { name };
            }
            LoadEvent::Finished(Ok(decoded)) => {
                let image = FloorplanImage {
                    name: decoded.name.clone(),
                    size: decoded.size(),
                };
                self.loader.texture = Some(ctx.load_texture(
                    "floorplan_image",
                    decoded.pixels,
                    egui::TextureOptions::LINEAR,
                ));
                let action = match message.origin {
                    LoadOrigin::Upload => {
                        self.calibration.cancel();
                        self.measure.clear();
                        Action::ImageUploaded(image)
                    }
                    LoadOrigin::Seed => Action::AttachImage(image),
                };
                self.dispatch(action);
                self.loader.load = ImageLoad::Loaded { name: decoded.name };
                self.ui.status = None;
            }
            LoadEvent::Finished(Err(e)) => {
                log::error!("image load failed: {e}");
                self.ui.status = Some(e.to_string());
                self.loader.load = ImageLoad::Failed(e.to_string());
            }
        }
    }

    /// Requests the image file picker on the next frame.
    pub fn request_image_upload(&mut self) {
        self.loader.pick_requested = true;
    }

    /// Starts loading the image of a seeded plan.
    pub fn load_seed_image(&mut self, asset: String) {
        self.start_load(ImageSource::Asset(asset), LoadOrigin::Seed);
    }

    /// Loads images dropped onto the window. Only the last dropped file is used.
    pub fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().last() else {
            return;
        };

        if let Some(bytes) = file.bytes {
            let name = if file.name.is_empty() {
                "dropped image".to_string()
            } else {
                file.name
            };
            self.start_load(
                ImageSource::Bytes {
                    name,
                    bytes: bytes.to_vec(),
                },
                LoadOrigin::Upload,
            );
            return;
        }

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(path) = file.path {
            self.start_load(ImageSource::Path(path), LoadOrigin::Upload);
        }
    }

    /// Starts a background load of a known source.
    pub fn start_load(&mut self, source: ImageSource, origin: LoadOrigin) {
        let request = self.next_request();
        let name = source.name();
        self.loader.load = ImageLoad::Loading { name: name.clone() };
        let sender = self.loader.sender.clone();
        let repaint = self.loader.repaint.clone();
        spawn_task(async move {
            let result = load_image(source).await;
            send(&sender, &repaint, request, origin, LoadEvent::Finished(result));
        });
    }

    fn next_request(&mut self) -> u64 {
        self.loader.request += 1;
        self.loader.request
    }

    /// Opens the platform file picker and loads the chosen image.
    fn start_picker(&mut self) {
        let request = self.next_request();
        let sender = self.loader.sender.clone();
        let repaint = self.loader.repaint.clone();

        #[cfg(not(target_arch = "wasm32"))]
        {
            spawn_task(async move {
                let Some(handle) = rfd::AsyncFileDialog::new()
                    .add_filter("Images", &crate::image_load::SUPPORTED_EXTENSIONS)
                    .pick_file()
                    .await
                else {
                    log::debug!("image picker cancelled");
                    return;
                };
                let source = ImageSource::Path(handle.path().to_path_buf());
                let started = LoadEvent::Started(source.name());
                send(&sender, &repaint, request, LoadOrigin::Upload, started);
                let finished = LoadEvent::Finished(load_image(source).await);
                send(&sender, &repaint, request, LoadOrigin::Upload, finished);
            });
        }

        #[cfg(target_arch = "wasm32")]
        {
            spawn_task(async move {
                let Some(file) = pick_image_file().await else {
                    log::debug!("image picker cancelled");
                    return;
                };
                let name = file.name();
                let started = LoadEvent::Started(name.clone());
                send(&sender, &repaint, request, LoadOrigin::Upload, started);
                let result = match read_file_bytes(&file).await {
                    Ok(bytes) => load_image(ImageSource::Bytes { name, bytes }).await,
                    Err(e) => Err(e),
                };
                send(&sender, &repaint, request, LoadOrigin::Upload, LoadEvent::Finished(result));
            });
        }
    }
}

/// Lets the user choose an image through a hidden `<input type="file">`.
///
/// Resolves to `None` when the element cannot be created or no file was chosen.
#[cfg(target_arch = "wasm32")]
async fn pick_image_file() -> Option<web_sys::File> {
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;

    let document = web_sys::window()?.document()?;
    let input = document
        .create_element("input")
        .ok()?
        .dyn_into::<web_sys::HtmlInputElement>()
        .ok()?;
    input.set_type("file");
    input.set_accept(".png,.jpg,.jpeg,image/png,image/jpeg");
    input.style().set_property("display", "none").ok()?;

    let (chosen_tx, chosen_rx) = futures::channel::oneshot::channel::<Option<web_sys::File>>();
    let chosen_tx = std::rc::Rc::new(std::cell::RefCell::new(Some(chosen_tx)));
    let on_change = Closure::wrap(Box::new(move |event: web_sys::Event| {
        let file = event
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
            .and_then(|input| input.files())
            .and_then(|files| files.get(0));
        if let Some(tx) = chosen_tx.borrow_mut().take() {
            let _ = tx.send(file);
        }
    }) as Box<dyn FnMut(_)>);
    input.set_onchange(Some(on_change.as_ref().unchecked_ref()));
    on_change.forget();

    let body = document.body()?;
    body.append_child(&input).ok()?;
    input.click();
    let file = chosen_rx.await.ok().flatten();
    let _ = body.remove_child(&input);
    file
}

/// Reads a browser `File` into memory.
#[cfg(target_arch = "wasm32")]
async fn read_file_bytes(file: &web_sys::File) -> Result<Vec<u8>, FloorplanError> {
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::{JsCast, JsValue};

    let read_error = |reason: String| FloorplanError::Read {
        name: file.name(),
        reason,
    };
    let reader = web_sys::FileReader::new()
        .map_err(|_| read_error("the browser could not create a FileReader".into()))?;

    let loaded = js_sys::Promise::new(&mut |resolve, reject| {
        let source = reader.clone();
        let on_load = Closure::wrap(Box::new(move |_: web_sys::ProgressEvent| {
            if let Ok(buffer) = source.result() {
                let _ = resolve.call1(&JsValue::NULL, &buffer);
            }
        }) as Box<dyn FnMut(_)>);
        reader.set_onload(Some(on_load.as_ref().unchecked_ref()));
        on_load.forget();

        let on_error = Closure::wrap(Box::new(move |_: web_sys::ProgressEvent| {
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("read aborted"));
        }) as Box<dyn FnMut(_)>);
        reader.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();
    });

    reader
        .read_as_array_buffer(file)
        .map_err(|_| read_error("reading could not start".into()))?;
    let buffer = wasm_bindgen_futures::JsFuture::from(loaded)
        .await
        .map_err(|e| read_error(format!("{e:?}")))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

fn send(
    sender: &Sender<LoadMessage>,
    repaint: &Option<egui::Context>,
    request: u64,
    origin: LoadOrigin,
    event: LoadEvent,
) {
    let _ = sender.send(LoadMessage {
        request,
        origin,
        event,
    });
    if let Some(ctx) = repaint {
        ctx.request_repaint();
    }
}

/// Runs a load task on the tokio runtime, or on a helper thread when none is running.
#[cfg(not(target_arch = "wasm32"))]
fn spawn_task(task: impl Future<Output = ()> + Send + 'static) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(task);
        }
        Err(_) => {
            std::thread::spawn(move || futures::executor::block_on(task));
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn spawn_task(task: impl Future<Output = ()> + 'static) {
    wasm_bindgen_futures::spawn_local(task);
}
