//! The browser end of the subscription socket. The protocol itself lives in `bookstream::graphql`.

use std::cell::RefCell;
use std::rc::Rc;

use bookstream::GatewayError;
use bookstream::data_model::Notification;
use bookstream::graphql::{ClientMessage, GatewayConfig, SUBPROTOCOL, SubscriptionSession};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

/// An open subscription socket. Dropping it closes the socket.
pub struct LiveFeed {
    socket: WebSocket,
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut(Event)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
}

fn socket_error(e: JsValue) -> GatewayError {
    GatewayError::Subscription(format!("{e:?}"))
}

fn send(socket: &WebSocket, message: &ClientMessage) {
    let sent = message
        .to_text()
        .and_then(|text| socket.send_with_str(&text).map_err(socket_error));
    if let Err(e) = sent {
        log::error!("WebSocket send failed: {e}");
    }
}

impl LiveFeed {
    pub fn connect(
        config: &GatewayConfig,
        on_notification: impl Fn(Notification) + 'static,
    ) -> Result<Self, GatewayError> {
        let socket = WebSocket::new_with_str(&config.ws_url, SUBPROTOCOL).map_err(socket_error)?;
        let session = Rc::new(RefCell::new(SubscriptionSession::new(config)));

        let on_open = {
            let socket = socket.clone();
            let session = session.clone();
            Closure::<dyn FnMut(Event)>::new(move |_: Event| {
                log::info!("WebSocket connected");
                let init = session.borrow_mut().on_open();
                send(&socket, &init);
            })
        };

        let on_message = {
            let socket = socket.clone();
            let session = session.clone();
            Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
                let Some(text) = event.data().as_string() else {
                    log::warn!("Ignoring binary WebSocket frame");
                    return;
                };
                // the session borrow ends here, before any listener gets to run
                let output = session.borrow_mut().on_text(&text);
                for reply in &output.replies {
                    send(&socket, reply);
                }
                for error in &output.errors {
                    log::error!("{error}");
                }
                for notification in output.notifications {
                    on_notification(notification);
                }
            })
        };

        let on_error = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            log::error!("WebSocket error");
        });

        let on_close = {
            let session = session.clone();
            Closure::<dyn FnMut(CloseEvent)>::new(move |event: CloseEvent| {
                let error = session.borrow_mut().on_close(event.code(), &event.reason());
                log::info!("WebSocket closed: {error}");
            })
        };

        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        socket.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        Ok(Self {
            socket,
            _on_open: on_open,
            _on_message: on_message,
            _on_error: on_error,
            _on_close: on_close,
        })
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        // the closures are freed right after this, so the socket must stop calling them first
        self.socket.set_onopen(None);
        self.socket.set_onmessage(None);
        self.socket.set_onerror(None);
        self.socket.set_onclose(None);
        if let Err(e) = self.socket.close() {
            log::warn!("Error closing WebSocket: {e:?}");
        }
    }
}
