//! Continuation preservation (§4.4.6): the whole-body statement split.
//!
//! A `#[prime_mover::blocking]` method body is written as ordinary
//! sequential code against three recognized "sugar" calls —
//! `devi.advance(duration)`, `devi.post_continuing_event(target, ordinal,
//! args)`, and `signal.wait()` — plus a fourth, dynamic one: a
//! self-referential call to one of the current impl block's own
//! `#[blocking]` stub methods (e.g. `self.next(args)`), each missing the
//! trailing `resume` argument the real signature takes. This module finds
//! the first such call in a block, splits the block there, and wraps
//! everything after it in a synthesized `Resume` closure, passed as the
//! missing argument. The closure body is produced by recursively applying
//! the same split to the remaining statements, so a method that suspends
//! more than once nests one closure inside another without any
//! special-casing.
//!
//! The fourth case is deliberately narrow: it only recognizes calls to
//! blocking methods declared in the *same* `impl` block being expanded,
//! because this module works purely syntactically (no type information is
//! available to resolve a call against some other concrete entity's
//! methods). A blocking call on a different entity still has to be spelled
//! out as `devi.post_continuing_event(..)` against that entity's own
//! generated ordinal.
//!
//! This is a conservative, whole-statement-list scan, not a dataflow
//! analysis: it only recognizes a suspending call written as a top-level
//! `let pat = ..;` or bare `..;` statement (not nested inside an `if`,
//! `match`, or loop), and every local bound before the split point is
//! implicitly captured into the closure by `move` rather than computed
//! as a minimal live set. Documented in DESIGN.md as the macro's
//! acknowledged simplification, not a missing feature — SPEC_FULL.md
//! §4.4.1 calls for exactly this trade-off.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Expr, ExprMethodCall, Local, Pat, PatType, Stmt, Type};

#[derive(Clone)]
enum Kind {
    Advance,
    PostContinuingEvent,
    Wait,
    Named(syn::Ident),
}

struct Suspension {
    kind: Kind,
    receiver: Expr,
    args: Vec<Expr>,
    binding: Option<Pat>,
    ty: Option<Type>,
}

fn call_in(expr: &Expr) -> Option<&ExprMethodCall> {
    match expr {
        Expr::MethodCall(call) => Some(call),
        _ => None,
    }
}

fn recognize(stmt: &Stmt, blocking_methods: &[String]) -> Option<Suspension> {
    let (call, binding, ty) = match stmt {
        Stmt::Local(Local { pat, init: Some(init), .. }) => {
            let call = call_in(&init.expr)?;
            match pat {
                Pat::Type(PatType { pat, ty, .. }) => (call, Some((**pat).clone()), Some((**ty).clone())),
                other => (call, Some(other.clone()), None),
            }
        }
        Stmt::Expr(expr, Some(_)) => (call_in(expr)?, None, None),
        _ => return None,
    };

    let method_name = call.method.to_string();
    let kind = match method_name.as_str() {
        "advance" => Kind::Advance,
        "post_continuing_event" => Kind::PostContinuingEvent,
        "wait" => Kind::Wait,
        _ if blocking_methods.iter().any(|name| name == &method_name) => Kind::Named(call.method.clone()),
        _ => return None,
    };

    Some(Suspension {
        kind,
        receiver: (*call.receiver).clone(),
        args: call.args.iter().cloned().collect(),
        binding,
        ty,
    })
}

/// Recursively transform a method body's statement list into its
/// continuation-passing form.
///
/// `finish` wraps whatever statements remain once no further suspension
/// is found — the tail of the original method, or the tail of a nested
/// resume closure, both need the same `Outcome::Done` wrapping a plain
/// (non-blocking) event method gets, so the caller supplies it once and
/// this function applies it at every point recursion bottoms out.
pub fn transform_block(stmts: &[Stmt], blocking_methods: &[String], finish: &impl Fn(&[Stmt]) -> TokenStream) -> TokenStream {
    for (index, stmt) in stmts.iter().enumerate() {
        if let Some(point) = recognize(stmt, blocking_methods) {
            let before = &stmts[..index];
            let after = &stmts[index + 1..];
            let resume_body = transform_block(after, blocking_methods, finish);
            return point.emit(before, resume_body);
        }
    }
    finish(stmts)
}

impl Suspension {
    fn emit(&self, before: &[Stmt], resume_body: TokenStream) -> TokenStream {
        let receiver = &self.receiver;
        let args = &self.args;

        let unwrap_and_bind = match (&self.ty, &self.binding) {
            (Some(ty), Some(pat)) => quote! {
                let __value = match __outcome {
                    ::prime_mover_core::ContinuationOutcome::Value(v) => v,
                    ::prime_mover_core::ContinuationOutcome::Error(__err) => return Err(__err),
                };
                let #pat: #ty = match __value {
                    ::std::option::Option::Some(__boxed) => *__boxed
                        .downcast::<#ty>()
                        .expect("continuation resolved with a value of an unexpected type"),
                    ::std::option::Option::None => {
                        ::std::panic!("continuation resolved without a value for a bound result")
                    }
                };
            },
            (_, Some(pat)) => quote! {
                if let ::prime_mover_core::ContinuationOutcome::Error(__err) = __outcome {
                    return Err(__err);
                }
                let #pat = ();
            },
            (_, None) => quote! {
                if let ::prime_mover_core::ContinuationOutcome::Error(__err) = __outcome {
                    return Err(__err);
                }
            },
        };

        let resume_closure = quote! {
            ::std::boxed::Box::new(
                move |devi: &mut ::prime_mover_core::Devi, __outcome: ::prime_mover_core::ContinuationOutcome|
                    -> ::std::result::Result<::prime_mover_core::Outcome, ::anyhow::Error>
                {
                    #unwrap_and_bind
                    #resume_body
                }
            )
        };

        let suspend_call = match &self.kind {
            Kind::Advance => quote! { ::std::result::Result::Ok(#receiver.advance(#(#args),*, #resume_closure)) },
            Kind::PostContinuingEvent => quote! {
                ::std::result::Result::Ok(#receiver.post_continuing_event(#(#args),*, #resume_closure))
            },
            Kind::Wait => quote! { #receiver.wait(devi, #resume_closure) },
            Kind::Named(method) => quote! {
                ::std::result::Result::Ok(#receiver.#method(#(#args),*, devi, #resume_closure))
            },
        };

        quote! {
            #(#before)*
            return #suspend_call;
        }
    }
}
