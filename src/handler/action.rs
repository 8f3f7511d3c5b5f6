use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::RouterError;

/// What a declared action parameter wants to receive.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    /// The current request
    Request,
    /// The response produced so far by the pipeline
    Response,
    /// A scalar filled from route parameters, defaults or `null`
    Value,
    /// Any other typed object; never bindable
    Object(String),
}

/// One declared action parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Value>,
}

impl ParamDecl {
    #[must_use]
    pub fn request(name: &str) -> Self {
        Self::of(name, ParamKind::Request)
    }

    #[must_use]
    pub fn response(name: &str) -> Self {
        Self::of(name, ParamKind::Response)
    }

    #[must_use]
    pub fn value(name: &str) -> Self {
        Self::of(name, ParamKind::Value)
    }

    #[must_use]
    pub fn object(name: &str, type_name: &str) -> Self {
        Self::of(name, ParamKind::Object(type_name.to_string()))
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    fn of(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            default: None,
        }
    }
}

/// Parameter list an action declares.
#[derive(Debug, Clone, PartialEq)]
pub enum Signature {
    Declared(Vec<ParamDecl>),
    /// No usable declaration: every route parameter is passed positionally
    /// and nothing else is bound.
    Opaque,
}

impl Signature {
    #[must_use]
    pub fn declared(params: Vec<ParamDecl>) -> Self {
        Signature::Declared(params)
    }
}

/// Where one call argument comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgSource {
    Request,
    Response,
    /// `index`-th route parameter, else `default`, else `null`
    Positional {
        index: usize,
        default: Option<Value>,
    },
}

/// Argument plan computed once from a [`Signature`].
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Bound(Vec<ArgSource>),
    Positional,
}

impl Descriptor {
    /// Build the argument plan.
    ///
    /// Binding the request or response twice fails with `DuplicateBinding`;
    /// object parameters fail with `UnsupportedBinding`.
    pub fn from_signature(signature: &Signature) -> Result<Self, RouterError> {
        let params = match signature {
            Signature::Opaque => return Ok(Descriptor::Positional),
            Signature::Declared(params) => params,
        };

        let mut sources = Vec::with_capacity(params.len());
        let mut seen_request = false;
        let mut seen_response = false;
        let mut position = 0;

        for param in params {
            match &param.kind {
                ParamKind::Request => {
                    if seen_request {
                        return Err(RouterError::DuplicateBinding {
                            param: param.name.clone(),
                            kind: "request",
                        });
                    }
                    seen_request = true;
                    sources.push(ArgSource::Request);
                }
                ParamKind::Response => {
                    if seen_response {
                        return Err(RouterError::DuplicateBinding {
                            param: param.name.clone(),
                            kind: "response",
                        });
                    }
                    seen_response = true;
                    sources.push(ArgSource::Response);
                }
                ParamKind::Object(type_name) => {
                    return Err(RouterError::UnsupportedBinding {
                        param: param.name.clone(),
                        type_name: type_name.clone(),
                    });
                }
                ParamKind::Value => {
                    sources.push(ArgSource::Positional {
                        index: position,
                        default: param.default.clone(),
                    });
                    position += 1;
                }
            }
        }
        Ok(Descriptor::Bound(sources))
    }
}

/// A bound call argument.
#[derive(Debug, Clone)]
pub enum Arg<'a> {
    Request(&'a HandlerRequest),
    Response(&'a HandlerResponse),
    Value(Value),
}

/// Arguments handed to an action, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Args<'a> {
    items: Vec<Arg<'a>>,
}

impl<'a> Args<'a> {
    pub(crate) fn new(items: Vec<Arg<'a>>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Argument at declaration position `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arg<'a>> {
        self.items.get(index)
    }

    /// The bound request, if the signature asked for it
    #[must_use]
    pub fn request(&self) -> Option<&'a HandlerRequest> {
        self.items.iter().find_map(|arg| match arg {
            Arg::Request(req) => Some(*req),
            _ => None,
        })
    }

    /// The bound response, if the signature asked for it
    #[must_use]
    pub fn response(&self) -> Option<&'a HandlerResponse> {
        self.items.iter().find_map(|arg| match arg {
            Arg::Response(res) => Some(*res),
            _ => None,
        })
    }

    /// Scalar arguments only, in order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.items.iter().filter_map(|arg| match arg {
            Arg::Value(v) => Some(v),
            _ => None,
        })
    }

    /// `index`-th scalar argument, `null` if absent
    #[must_use]
    pub fn value(&self, index: usize) -> &Value {
        self.values().nth(index).unwrap_or(&Value::Null)
    }
}

type ActionFn = dyn Fn(Args<'_>) -> anyhow::Result<HandlerResponse> + Send + Sync;

/// A callable handler together with its precomputed argument plan.
#[derive(Clone)]
pub struct Action {
    signature: Signature,
    descriptor: Result<Descriptor, RouterError>,
    body: Arc<ActionFn>,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("signature", &self.signature)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl Action {
    /// Wrap a function with an explicit signature.
    ///
    /// The descriptor is computed here; a signature that cannot be bound does
    /// not fail now but makes every invocation return the binding error.
    pub fn new<F>(signature: Signature, body: F) -> Self
    where
        F: Fn(Args<'_>) -> anyhow::Result<HandlerResponse> + Send + Sync + 'static,
    {
        let descriptor = Descriptor::from_signature(&signature);
        if let Err(e) = &descriptor {
            tracing::warn!(error = %e, "Action signature cannot be bound");
        }
        Self {
            signature,
            descriptor,
            body: Arc::new(body),
        }
    }

    /// Action receiving every route parameter positionally.
    pub fn positional<F>(body: F) -> Self
    where
        F: Fn(Args<'_>) -> anyhow::Result<HandlerResponse> + Send + Sync + 'static,
    {
        Self::new(Signature::Opaque, body)
    }

    /// Action taking only the request.
    pub fn from_request_fn<F>(f: F) -> Self
    where
        F: Fn(&HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        Self::new(
            Signature::declared(vec![ParamDecl::request("request")]),
            move |args| match args.request() {
                Some(req) => Ok(f(req)),
                None => Err(anyhow::anyhow!("request was not bound")),
            },
        )
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn descriptor(&self) -> Result<&Descriptor, &RouterError> {
        self.descriptor.as_ref()
    }

    /// Bind arguments and call the action.
    pub fn invoke(
        &self,
        req: &HandlerRequest,
        res: &HandlerResponse,
    ) -> Result<HandlerResponse, RouterError> {
        let descriptor = self.descriptor.as_ref().map_err(Clone::clone)?;
        let args = super::invoker::bind_arguments(descriptor, req, res);
        (self.body)(args).map_err(|e| RouterError::Handler(format!("{e:#}")))
    }
}
