use darling::{ast, FromMeta};
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::spanned::Spanned;

#[derive(FromMeta)]
struct RouteArgs {
	#[darling(multiple)]
	tag: Vec<syn::Expr>,
	#[darling(multiple)]
	response: Vec<ResponseArgs>,
}

#[derive(FromMeta)]
struct ResponseArgs {
	status: syn::LitInt,
	shape: Option<syn::Type>,
	description: Option<String>,
}

/// The summary and description of an operation, taken from its doc comment.
struct Docs {
	summary: String,
	description: Option<String>,
}

pub fn from_input(args: TokenStream, input: TokenStream) -> TokenStream {
	let args = match ast::NestedMeta::parse_meta_list(args.into()) {
		Ok(x) => x,
		Err(e) => return e.into_compile_error().into(),
	};

	let args = match RouteArgs::from_list(&args) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	let function = syn::parse_macro_input!(input as syn::ItemFn);
	let docs = match extract_docs(&function) {
		Ok(x) => x,
		Err(e) => return e.into_compile_error().into(),
	};

	let fn_name = format_ident!("{}_docs", function.sig.ident);
	let fn_vis = &function.vis;

	let summary = docs.summary;
	let description = docs.description.map(|description| {
		quote! {
			.description(#description)
		}
	});

	let tags = args.tag.iter();
	let responses = args.response.into_iter().map(|response| {
		let status = response.status;
		let shape = response.shape.map_or_else(|| quote!(()), |x| quote!(#x));

		match response.description {
			Some(description) => quote! {
				.response_with::<#status, #shape, _>(|res| res.description(#description))
			},
			None => quote! {
				.response::<#status, #shape>()
			},
		}
	});

	quote! {
		#function

		#fn_vis fn #fn_name(op: aide::transform::TransformOperation) -> aide::transform::TransformOperation {
			op.summary(#summary)
				#description
				#(
					.tag(#tags)
				)*
				#(
					#responses
				)*
		}
	}
	.into()
}

/// Reads the `///` lines of a function the way rustdoc does.
///
/// The first line is the summary and must exist. Everything after it is
/// joined into the description.
fn extract_docs(function: &syn::ItemFn) -> syn::Result<Docs> {
	let lines = function
		.attrs
		.iter()
		.filter(|attr| attr.path().is_ident("doc"))
		.filter_map(|attr| match &attr.meta {
			syn::Meta::NameValue(syn::MetaNameValue {
				value:
					syn::Expr::Lit(syn::ExprLit {
						lit: syn::Lit::Str(literal),
						..
					}),
				..
			}) => Some(literal.value().trim().to_owned()),
			_ => None,
		})
		.collect::<Vec<_>>();

	let mut lines = lines.iter().filter(|line| !line.is_empty());

	let summary = lines.next().cloned().ok_or_else(|| {
		syn::Error::new(
			function.sig.ident.span(),
			"routes need a doc comment, the first line is used as the summary",
		)
	})?;

	let description = lines.cloned().collect::<Vec<_>>().join(" ");
	let description = (!description.is_empty()).then_some(description);

	if summary.len() > 80 {
		return Err(syn::Error::new(
			function.span(),
			"the summary line should be short, move the details to the next line",
		));
	}

	Ok(Docs {
		summary,
		description,
	})
}
