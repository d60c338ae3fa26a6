use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, Pat};

/// Time a function when the `perf_stats` feature is enabled.
///
/// The function body is wrapped with a guard that measures wall time and logs
/// it on drop through bevy's `info!`. Without `perf_stats` nothing is emitted
/// and the function is left untouched.
///
/// # Frame sampling
/// If the function takes a parameter named `frame` whose type mentions
/// `FrameCount` (e.g. `frame: Res<FrameCount>`), the timing is also logged
/// every 100th frame regardless of the threshold, so slow drifts stay visible.
///
/// # Example
/// ```ignore
/// #[profile(2)] // log when slower than 2ms
/// pub fn sort_visible(frame: Res<FrameCount>, ...) {
///     // ... work ...
/// }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        attr.to_string().trim().parse().unwrap_or(1)
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name_str = sig.ident.to_string();

    let has_frame_param = sig.inputs.iter().any(|arg| {
        let FnArg::Typed(pat_type) = arg else {
            return false;
        };
        let Pat::Ident(pat_ident) = &*pat_type.pat else {
            return false;
        };
        if pat_ident.ident != "frame" {
            return false;
        }
        let ty = &pat_type.ty;
        quote!(#ty).to_string().contains("FrameCount")
    });

    let frame_value = if has_frame_param {
        quote! { Some(frame.0) }
    } else {
        quote! { None }
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_timer = {
                struct ProfileGuard {
                    name: &'static str,
                    start: std::time::Instant,
                    frame: Option<u32>,
                }
                impl Drop for ProfileGuard {
                    fn drop(&mut self) {
                        let elapsed = self.start.elapsed();
                        let sampled = self.frame.is_some_and(|f| f % 100 == 0);
                        if elapsed.as_millis() > #threshold_ms || sampled {
                            bevy::prelude::info!("[PERF] {}: {:?}", self.name, elapsed);
                        }
                    }
                }
                ProfileGuard {
                    name: #fn_name_str,
                    start: std::time::Instant::now(),
                    frame: #frame_value,
                }
            };

            #block
        }
    };

    output.into()
}
