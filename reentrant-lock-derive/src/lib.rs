use proc_macro::TokenStream;
use syn::{parse_macro_input, ItemFn};

mod gen_locked;
mod parse;

/// Hold a reentrant lock field for the whole body of a `&self` method.
///
/// ```text
/// #[locked(read)]                      // self.lock, shared
/// #[locked(write)]                     // self.lock, exclusive
/// #[locked(write, lock = state_lock)]  // self.state_lock, exclusive
/// ```
///
/// The field must implement `reentrant_lock::AcquireLock`. The level is
/// released on every exit path, including early `return` and `?`.
#[proc_macro_attribute]
pub fn locked(attr: TokenStream, item: TokenStream) -> TokenStream {
    let item_fn = parse_macro_input!(item as ItemFn);
    let attr2 = proc_macro2::TokenStream::from(attr);

    let args = match parse::parse(attr2, &item_fn) {
        Ok(args) => args,
        Err(e) => return e.to_compile_error().into(),
    };

    gen_locked::generate(&args, item_fn).into()
}
