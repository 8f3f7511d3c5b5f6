use railyard::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
use railyard::handler::{
    Action, Arg, ArgSource, Controller, ControllerRegistry, Descriptor, HandlerRef, ParamDecl,
    Signature, DEFAULT_ACTION,
};
use railyard::router::Router;
use railyard::RouterError;
use serde_json::{json, Value};

mod common;
use common::fixtures::text;

/// Dispatch `uri` against a single GET route running `action`
fn run(pattern: &str, uri: &str, action: Action) -> HandlerResponse {
    let mut router = Router::new();
    router.get(pattern, action).unwrap();
    Dispatcher::builder(router).build().unwrap().dispatch_uri(uri)
}

#[test]
fn test_descriptor_positions_skip_request_and_response() {
    let signature = Signature::declared(vec![
        ParamDecl::value("year"),
        ParamDecl::request("req"),
        ParamDecl::value("slug").with_default("index"),
        ParamDecl::response("res"),
    ]);
    let descriptor = Descriptor::from_signature(&signature).unwrap();
    assert_eq!(
        descriptor,
        Descriptor::Bound(vec![
            ArgSource::Positional {
                index: 0,
                default: None
            },
            ArgSource::Request,
            ArgSource::Positional {
                index: 1,
                default: Some(json!("index"))
            },
            ArgSource::Response,
        ])
    );
}

#[test]
fn test_descriptor_rejects_objects_and_duplicates() {
    let err = Descriptor::from_signature(&Signature::declared(vec![ParamDecl::object(
        "repo",
        "UserRepository",
    )]))
    .unwrap_err();
    assert_eq!(
        err,
        RouterError::UnsupportedBinding {
            param: "repo".to_string(),
            type_name: "UserRepository".to_string()
        }
    );

    let err = Descriptor::from_signature(&Signature::declared(vec![
        ParamDecl::response("a"),
        ParamDecl::response("b"),
    ]))
    .unwrap_err();
    assert_eq!(
        err,
        RouterError::DuplicateBinding {
            param: "b".to_string(),
            kind: "response"
        }
    );

    assert_eq!(
        Descriptor::from_signature(&Signature::Opaque).unwrap(),
        Descriptor::Positional
    );
}

#[test]
fn test_values_fill_from_params_then_defaults_then_null() {
    let action = Action::new(
        Signature::declared(vec![
            ParamDecl::value("year"),
            ParamDecl::value("page").with_default(1),
            ParamDecl::value("extra"),
        ]),
        |args| {
            let values: Vec<Value> = args.values().cloned().collect();
            Ok(HandlerResponse::json(200, &Value::Array(values)))
        },
    );
    let res = run("archive/{year:int}", "/archive/2024", action);
    assert_eq!(res.json_body().unwrap(), json!([2024, 1, null]));
}

#[test]
fn test_request_and_response_are_bound_in_place() {
    let action = Action::new(
        Signature::declared(vec![
            ParamDecl::response("res"),
            ParamDecl::value("id"),
            ParamDecl::request("req"),
        ]),
        |args| {
            assert!(matches!(args.get(0), Some(Arg::Response(_))));
            assert!(matches!(args.get(2), Some(Arg::Request(_))));
            let req = args.request().unwrap();
            let res = args.response().unwrap();
            Ok(HandlerResponse::ok(format!(
                "{} {} {}",
                req.path,
                res.status,
                args.value(0)
            )))
        },
    );
    let res = run("items/{id:int}", "/items/7", action);
    assert_eq!(res.body, "items/7 200 7");
}

#[test]
fn test_opaque_signature_receives_every_param_positionally() {
    let action = Action::positional(|args| {
        assert!(args.request().is_none());
        let joined: Vec<String> = args.values().map(Value::to_string).collect();
        Ok(HandlerResponse::ok(joined.join(",")))
    });
    let res = run("{a:int}/{b:bool}/{c}", "/5/yes/x", action);
    assert_eq!(res.body, r#"5,true,"x""#);
}

#[test]
fn test_no_params_and_no_declarations() {
    let action = Action::new(Signature::declared(Vec::new()), |args| {
        Ok(HandlerResponse::ok(args.len().to_string()))
    });
    assert_eq!(run("count/{n:int}", "/count/3", action).body, "0");
}

#[test]
fn test_handler_ref_parsing() {
    match HandlerRef::parse(" Reports@export ") {
        HandlerRef::Controller { target, action } => {
            assert_eq!(target, "Reports");
            assert_eq!(action, "export");
        }
        HandlerRef::Action(_) => panic!("expected controller reference"),
    }
    assert_eq!(HandlerRef::parse("Home").label(), format!("Home@{DEFAULT_ACTION}"));
    assert_eq!(HandlerRef::from(("Admin", "dashboard")).label(), "Admin@dashboard");
    assert_eq!(HandlerRef::from(text("x")).label(), "<closure>");
}

#[test]
fn test_controller_registry_resolution() {
    let mut registry = ControllerRegistry::new();
    registry.register(Controller::new("Pages").action("about", text("about us")));

    assert!(registry.resolve(&HandlerRef::parse("Pages@about")).is_ok());
    assert_eq!(
        registry.resolve(&HandlerRef::parse("Pages@missing")).unwrap_err(),
        RouterError::HandlerNotFound("Pages@missing".to_string())
    );
    assert_eq!(
        registry.resolve(&HandlerRef::parse("Nope")).unwrap_err(),
        RouterError::HandlerNotFound("Nope@index".to_string())
    );

    let inline = text("inline");
    assert!(registry.resolve(&HandlerRef::from(inline)).is_ok());
}

#[test]
fn test_invoke_directly() {
    let action = Action::new(Signature::declared(vec![ParamDecl::request("r")]), |args| {
        let req = args.request().unwrap();
        Ok(HandlerResponse::ok(req.original_method.to_string()))
    });
    let req = HandlerRequest::post("/direct");
    let res = action.invoke(&req, &HandlerResponse::default()).unwrap();
    assert_eq!(res.body, "POST");
    assert!(action.descriptor().is_ok());
}
