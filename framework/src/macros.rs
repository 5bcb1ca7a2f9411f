/// Turns an `async fn(Ctx) -> Result<_, _>` into the boxed function pointer the
/// builders expect, e.g. `handler_func!(commands::ping)`.
#[macro_export]
macro_rules! handler_func {
    ($func:expr $(,)?) => {
        |ctx| Box::pin($func(ctx))
    };
}
