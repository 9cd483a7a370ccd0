use crate::parse::{LockedArgs, Mode};
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{Ident, ItemFn};

pub fn generate(args: &LockedArgs, item: ItemFn) -> TokenStream {
    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = item;

    let field = &args.field;
    let acquire = match args.mode {
        Mode::Read => format_ident!("acquire_read"),
        Mode::Write => format_ident!("acquire_write"),
    };
    // mixed_site: the body cannot name or shadow the guard
    let guard = Ident::new("__locked_guard", Span::mixed_site());

    quote! {
        #(#attrs)*
        #vis #sig {
            let #guard = {
                use reentrant_lock::AcquireLock as _;
                self.#field.#acquire()
            };
            #block
        }
    }
}
