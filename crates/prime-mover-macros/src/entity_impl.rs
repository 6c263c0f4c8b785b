//! `#[prime_mover::entity]` (§4.4, steps 1-4).
//!
//! Expands an `impl Target { .. }` block into the same `impl` plus an
//! `impl Entity for Target` generated from it, following the same
//! outside-in transform shape `durable-bindgen` uses when it turns a
//! parsed `syn::File` of generated bindings into formatted output: parse
//! the whole unit once, walk it, emit a new unit.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{FnArg, ImplItem, ImplItemFn, ItemImpl, Pat, PatType, ReturnType, Type, Visibility};

use crate::suspend;
use crate::time_api;

const MARKER_CONST: &str = "__PRIME_MOVER_TRANSFORMED";

struct Qualifying {
    method: ImplItemFn,
    blocking: bool,
}

fn has_attr(method: &ImplItemFn, name: &str) -> bool {
    method.attrs.iter().any(|attr| attr.path().is_ident(name))
}

fn strip_markers(method: &mut ImplItemFn) {
    method.attrs.retain(|attr| !["blocking", "event", "non_event"].iter().any(|name| attr.path().is_ident(name)));
}

fn type_name(ty: &Type) -> String {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|seg| seg.ident.to_string()).unwrap_or_else(|| quote!(#ty).to_string()),
        other => quote!(#other).to_string(),
    }
}

/// The method's parameters beyond `self`, as `(ident, type)` pairs in
/// declaration order — these are exactly the positions an `invoke`
/// caller's `Arguments` vector supplies. The entity body's `devi`
/// parameter is always macro-injected (see [`generate_body_fn`]), so a
/// qualifying method's own parameter list never declares one.
fn positional_params(sig: &syn::Signature) -> Vec<(syn::Ident, Type)> {
    sig.inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(PatType { pat, ty, .. }) => match pat.as_ref() {
                Pat::Ident(pat_ident) => Some((pat_ident.ident.clone(), (**ty).clone())),
                _ => None,
            },
            FnArg::Receiver(_) => None,
        })
        .collect()
}

/// Build the `Outcome::Done`-wrapping tail shared by a plain event
/// method and the point where a blocking method's continuation chain
/// finally bottoms out with no further suspension.
fn done_wrapper<'a>(ret_ty: Option<&'a Type>) -> impl Fn(&[syn::Stmt]) -> TokenStream + 'a {
    move |stmts: &[syn::Stmt]| match ret_ty {
        None => quote! {
            #(#stmts)*
            ::std::result::Result::Ok(::prime_mover_core::Outcome::Done(::std::option::Option::None))
        },
        Some(ty) => quote! {
            let __pm_result: #ty = { #(#stmts)* };
            ::std::result::Result::Ok(::prime_mover_core::Outcome::Done(::std::option::Option::Some(
                ::std::boxed::Box::new(__pm_result)
            )))
        },
    }
}

/// Build the real event-method stub named `M` (§4.4.1 step 1): the thing
/// modeler code actually calls. It binds the positional arguments into an
/// `Arguments` vector, wraps `self` as an `EntityHandle`, and posts the
/// event through `devi` — it never runs the method body itself, that's
/// what [`generate_body_fn`]'s `__pm_body_M` and the `invoke` dispatch are
/// for. Blocking stubs take the trailing `resume` the real
/// `Devi::post_continuing_event` signature needs and return its bare
/// `Outcome`; non-blocking stubs return the method's declared return type
/// by its `Default`, since the real value (if any) only exists once the
/// posted event actually runs.
fn generate_stub_fn(method_name: &syn::Ident, ordinal: usize, entry: &Qualifying, params: &[(syn::Ident, Type)], ret_ty: Option<&Type>) -> TokenStream {
    let arg_pushes: Vec<_> = params
        .iter()
        .map(|(ident, _)| {
            quote! { __pm_args.push(::std::boxed::Box::new(#ident)); }
        })
        .collect();
    let param_tokens: Vec<_> = params.iter().map(|(ident, ty)| quote! { #ident: #ty }).collect();

    let build_target = quote! {
        let mut __pm_args: ::prime_mover_core::Arguments = ::std::vec::Vec::new();
        #(#arg_pushes)*
        let __pm_target: ::prime_mover_core::EntityHandle = ::std::sync::Arc::new(::std::clone::Clone::clone(self));
    };

    if entry.blocking {
        quote! {
            #[allow(unused_variables)]
            pub fn #method_name(&self #(, #param_tokens)*, devi: &mut ::prime_mover_core::Devi, resume: ::prime_mover_core::Resume) -> ::prime_mover_core::Outcome {
                #build_target
                devi.post_continuing_event(__pm_target, #ordinal, __pm_args, resume)
            }
        }
    } else {
        let ret = ret_ty.map(|ty| quote!(#ty)).unwrap_or_else(|| quote!(()));
        let default_ret = ret_ty.map(|_| quote!(<#ret as ::std::default::Default>::default())).unwrap_or_else(|| quote!(()));
        quote! {
            #[allow(unused_variables)]
            pub fn #method_name(&self #(, #param_tokens)*, devi: &mut ::prime_mover_core::Devi) -> #ret {
                #build_target
                devi.post_event(__pm_target, #ordinal, __pm_args);
                #default_ret
            }
        }
    }
}

fn generate_body_fn(
    body_name: &syn::Ident,
    entry: &Qualifying,
    params: &[(syn::Ident, Type)],
    ret_ty: Option<&Type>,
    blocking_methods: &[String],
) -> TokenStream {
    let receiver = match entry.method.sig.inputs.first() {
        Some(FnArg::Receiver(r)) => quote!(#r),
        _ => quote!(&self),
    };

    let mut body = entry.method.block.clone();
    time_api::rewrite(&mut body);

    let finish = done_wrapper(ret_ty);
    let stmts = body.stmts;
    let transformed = if entry.blocking {
        suspend::transform_block(&stmts, blocking_methods, &finish)
    } else {
        finish(&stmts)
    };

    let devi_param = quote! { , devi: &mut ::prime_mover_core::Devi };

    let param_tokens: Vec<_> = params.iter().map(|(ident, ty)| quote! { #ident: #ty }).collect();

    quote! {
        #[allow(unused_variables)]
        fn #body_name(#receiver #(, #param_tokens)* #devi_param) -> ::std::result::Result<::prime_mover_core::Outcome, ::anyhow::Error> {
            #transformed
        }
    }
}

pub fn expand(item: ItemImpl) -> TokenStream {
    if let Some(existing) = item.items.iter().find_map(|member| match member {
        ImplItem::Const(c) if c.ident == MARKER_CONST => Some(c),
        _ => None,
    }) {
        return syn::Error::new_spanned(
            existing,
            "this impl has already been transformed by #[prime_mover::entity] \
             (AlreadyTransformedMismatch: re-running the macro over an already-marked \
             impl is a build-time error, not a runtime one)",
        )
        .to_compile_error();
    }

    let self_ty = item.self_ty.clone();
    let self_name = type_name(&self_ty);

    let mut qualifying: Vec<Qualifying> = Vec::new();
    let mut passthrough = Vec::new();
    let any_marked = item
        .items
        .iter()
        .any(|member| matches!(member, ImplItem::Fn(f) if has_attr(f, "blocking") || has_attr(f, "event")));

    for member in item.items {
        let ImplItem::Fn(mut method) = member else {
            passthrough.push(member);
            continue;
        };

        if has_attr(&method, "non_event") {
            strip_markers(&mut method);
            passthrough.push(ImplItem::Fn(method));
            continue;
        }

        let blocking = has_attr(&method, "blocking");
        let explicit_event = has_attr(&method, "event");
        let is_default_event = !any_marked && matches!(method.vis, Visibility::Public(_));

        if blocking || explicit_event || is_default_event {
            strip_markers(&mut method);
            qualifying.push(Qualifying { method, blocking });
        } else {
            passthrough.push(ImplItem::Fn(method));
        }
    }

    // Alphabetical-by-signature, not declaration order, so ordinals stay
    // stable across incremental rebuilds that merely reorder methods.
    qualifying.sort_by(|a, b| a.method.sig.ident.to_string().cmp(&b.method.sig.ident.to_string()));

    let blocking_methods: Vec<String> =
        qualifying.iter().filter(|entry| entry.blocking).map(|entry| entry.method.sig.ident.to_string()).collect();

    let mut invoke_arms = Vec::new();
    let mut signature_arms = Vec::new();
    let mut ordinal_entries = Vec::new();
    let mut generated_methods = Vec::new();
    let mut stub_methods = Vec::new();

    for (ordinal, entry) in qualifying.iter().enumerate() {
        let method_name = entry.method.sig.ident.to_string();
        let method_ident = entry.method.sig.ident.clone();
        let signature = format!("{self_name}::{method_name}");
        let body_name = syn::Ident::new(&format!("__pm_body_{method_name}"), Span::call_site());

        let params = positional_params(&entry.method.sig);
        let ret_ty = match &entry.method.sig.output {
            ReturnType::Default => None,
            ReturnType::Type(_, ty) => Some((**ty).clone()),
        };

        generated_methods.push(generate_body_fn(&body_name, entry, &params, ret_ty.as_ref(), &blocking_methods));
        stub_methods.push(generate_stub_fn(&method_ident, ordinal, entry, &params, ret_ty.as_ref()));

        let mut arg_binds = Vec::new();
        let mut arg_idents = Vec::new();
        for (index, (_, ty)) in params.iter().enumerate() {
            let binding = syn::Ident::new(&format!("__pm_arg{index}"), Span::call_site());
            arg_binds.push(quote! {
                let #binding: #ty = *__pm_args
                    .next()
                    .unwrap_or_else(|| ::std::panic!("missing argument {} for `{}`", #index, #signature))
                    .downcast::<#ty>()
                    .unwrap_or_else(|_| ::std::panic!("argument {} type mismatch for `{}`", #index, #signature));
            });
            arg_idents.push(binding);
        }

        let mut call_args: Vec<TokenStream> = arg_idents.iter().map(|ident| quote! { #ident }).collect();
        call_args.push(quote! { __pm_devi });

        invoke_arms.push(quote! {
            #ordinal => {
                let mut __pm_args = __pm_arguments.into_iter();
                #(#arg_binds)*
                self.#body_name(#(#call_args),*)
            }
        });
        signature_arms.push(quote! { #ordinal => #signature, });
        ordinal_entries.push(quote! { (#method_name, #signature) });
    }

    let generated_at = "#[prime_mover::entity]";
    let marker_doc = format!("Transformation marker for `{self_name}`.");
    let marker_ident = syn::Ident::new(MARKER_CONST, Span::call_site());

    quote! {
        impl #self_ty {
            #(#passthrough)*
            #(#generated_methods)*

            #[doc = #marker_doc]
            pub const #marker_ident: ::prime_mover_core::AlreadyTransformed =
                ::prime_mover_core::AlreadyTransformed::new(#generated_at, &[#(#ordinal_entries),*]);
        }

        // Stubs need `Arc::new(self.clone())` to build an `EntityHandle`
        // (spec.md §9, "Entity polymorphism" — event methods take `&self`,
        // so the only way to hand the scheduler a handle it can outlive
        // the call with is to clone the `Arc<Mutex<_>>`-backed state behind
        // it). Kept in its own `impl` block rather than folded into the one
        // above so passthrough methods never pick up a `Clone` bound they
        // don't need.
        impl #self_ty where #self_ty: ::std::clone::Clone {
            #(#stub_methods)*
        }

        impl ::prime_mover_core::Entity for #self_ty {
            fn invoke(
                &self,
                __pm_ordinal: usize,
                __pm_arguments: ::prime_mover_core::Arguments,
                __pm_devi: &mut ::prime_mover_core::Devi,
            ) -> ::std::result::Result<::prime_mover_core::Outcome, ::anyhow::Error> {
                match __pm_ordinal {
                    #(#invoke_arms)*
                    other => ::std::result::Result::Err(::anyhow::Error::from(
                        ::prime_mover_core::SimulationError::UnknownOrdinal { entity: #self_name, ordinal: other }
                    )),
                }
            }

            fn signature_for(&self, __pm_ordinal: usize) -> &'static str {
                match __pm_ordinal {
                    #(#signature_arms)*
                    other => ::std::panic!("no event method with ordinal {other} on `{}`", #self_name),
                }
            }

            fn type_name(&self) -> &'static str {
                #self_name
            }
        }
    }
}
