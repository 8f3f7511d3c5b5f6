#![allow(dead_code)]

pub mod temp_files {
    use std::io::Write;

    use tempfile::NamedTempFile;

    /// Write `content` to a fresh temporary file with the given extension.
    pub fn create_temp(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("railyard_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> NamedTempFile {
        create_temp(content, "yaml")
    }
}

pub mod tracing_util {
    use tracing::subscriber::DefaultGuard;

    /// Routes `tracing` output of the current test thread to the test writer.
    pub struct TestTracing {
        _guard: DefaultGuard,
    }

    impl TestTracing {
        pub fn init() -> Self {
            let subscriber = tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(tracing::Level::DEBUG)
                .finish();
            Self {
                _guard: tracing::subscriber::set_default(subscriber),
            }
        }
    }
}

pub mod fixtures {
    use std::sync::{Arc, Mutex};

    use railyard::dispatcher::{HandlerRequest, HandlerResponse};
    use railyard::handler::Action;
    use railyard::middleware::{from_fn, Middleware};
    use serde_json::{json, Value};

    /// Action answering with a fixed text body
    pub fn text(body: &'static str) -> Action {
        Action::from_request_fn(move |_req| HandlerResponse::ok(body))
    }

    /// Action echoing the effective method, route name and converted params
    pub fn echo() -> Action {
        Action::from_request_fn(|req: &HandlerRequest| {
            HandlerResponse::json(
                200,
                &json!({
                    "method": req.method.as_str(),
                    "original_method": req.original_method.as_str(),
                    "route": req.route_name,
                    "group": req.route_group,
                    "params": req.path_params_map(),
                }),
            )
        })
    }

    /// Converted params out of an [`echo`] response
    pub fn echoed_params(res: &HandlerResponse) -> Value {
        res.json_body()
            .and_then(|body| body.get("params").cloned())
            .unwrap_or(Value::Null)
    }

    /// Middleware appending `|name` to the body after calling `next`
    pub fn appender(name: &'static str) -> Arc<dyn Middleware> {
        from_fn(name, move |req, res, next| {
            let mut res = next(req, res);
            res.body.push('|');
            res.body.push_str(name);
            res
        })
    }

    /// Middleware recording `name` on the way in
    pub fn recorder(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<dyn Middleware> {
        from_fn(name, move |req, res, next| {
            log.lock().unwrap().push(name.to_string());
            next(req, res)
        })
    }
}
