use serde_json::Value;

use super::action::{Arg, ArgSource, Args, Descriptor};
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Compute call arguments from a descriptor.
///
/// Scalar arguments fill from the converted route parameters in pattern
/// order, then from the declared default, then `null`.
pub(crate) fn bind_arguments<'a>(
    descriptor: &Descriptor,
    req: &'a HandlerRequest,
    res: &'a HandlerResponse,
) -> Args<'a> {
    let route_values = req.path_params.iter().map(|(_, v)| v);
    let items = match descriptor {
        Descriptor::Positional => route_values.cloned().map(Arg::Value).collect(),
        Descriptor::Bound(sources) => {
            let route_values: Vec<&Value> = route_values.collect();
            sources
                .iter()
                .map(|source| match source {
                    ArgSource::Request => Arg::Request(req),
                    ArgSource::Response => Arg::Response(res),
                    ArgSource::Positional { index, default } => Arg::Value(
                        route_values
                            .get(*index)
                            .map(|v| (*v).clone())
                            .or_else(|| default.clone())
                            .unwrap_or(Value::Null),
                    ),
                })
                .collect()
        }
    };
    Args::new(items)
}
