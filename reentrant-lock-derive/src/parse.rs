use proc_macro2::{Span, TokenStream};
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Expr, Ident, ItemFn, Meta, Token};

const USAGE: &str = "usage: #[locked(read)] or #[locked(write, lock = field)]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

pub struct LockedArgs {
    pub mode: Mode,
    pub field: Ident,
}

pub fn parse(attr: TokenStream, item: &ItemFn) -> syn::Result<LockedArgs> {
    let metas = Punctuated::<Meta, Token![,]>::parse_terminated.parse2(attr)?;

    let mut mode = None;
    let mut field = None;

    for meta in &metas {
        match meta {
            Meta::Path(path) if path.is_ident("read") || path.is_ident("write") => {
                if mode.is_some() {
                    return Err(syn::Error::new_spanned(path, "lock mode given more than once"));
                }
                mode = Some(if path.is_ident("read") { Mode::Read } else { Mode::Write });
            }
            Meta::NameValue(nv) if nv.path.is_ident("lock") => {
                if field.is_some() {
                    return Err(syn::Error::new_spanned(nv, "`lock` given more than once"));
                }
                field = Some(field_ident(&nv.value)?);
            }
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    format!("unknown `locked` option; {USAGE}"),
                ));
            }
        }
    }

    let Some(mode) = mode else {
        return Err(syn::Error::new(
            Span::call_site(),
            format!("missing lock mode; {USAGE}"),
        ));
    };

    check_signature(item)?;

    Ok(LockedArgs {
        mode,
        field: field.unwrap_or_else(|| Ident::new("lock", Span::call_site())),
    })
}

fn field_ident(value: &Expr) -> syn::Result<Ident> {
    if let Expr::Path(expr) = value {
        if let Some(ident) = expr.path.get_ident() {
            return Ok(ident.clone());
        }
    }
    Err(syn::Error::new_spanned(value, "`lock` expects a field name"))
}

fn check_signature(item: &ItemFn) -> syn::Result<()> {
    let sig = &item.sig;

    if let Some(token) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            token,
            "`locked` cannot be used on `async fn`: the lock blocks the thread",
        ));
    }
    if let Some(token) = &sig.constness {
        return Err(syn::Error::new_spanned(token, "`locked` cannot be used on `const fn`"));
    }

    match sig.receiver() {
        None => Err(syn::Error::new_spanned(
            &sig.ident,
            "`locked` requires a `&self` receiver",
        )),
        Some(receiver) if receiver.reference.is_none() => Err(syn::Error::new_spanned(
            receiver,
            "`locked` requires `&self`; `self` by value cannot lend a lock to the body",
        )),
        Some(receiver) if receiver.mutability.is_some() => Err(syn::Error::new_spanned(
            receiver,
            "`locked` requires `&self`; `&mut self` is already exclusive",
        )),
        Some(_) => Ok(()),
    }
}
