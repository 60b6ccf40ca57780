//! Product administration.

use anyhow::Result;
use dialoguer::Confirm;
use fiesta_commerce::catalog::ProductDraft;
use fiesta_commerce::ids::ProductId;

use super::{ProductFields, ProductsArgs, ProductsCommand};
use crate::context::Context;

impl From<ProductFields> for ProductDraft {
    fn from(fields: ProductFields) -> Self {
        ProductDraft {
            name: fields.name,
            description: fields.description,
            price: fields.price,
            stock: fields.stock,
            image: fields.image.filter(|i| !i.trim().is_empty()),
        }
    }
}

/// Run the products command.
pub async fn run(args: ProductsArgs, ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    match args.command {
        ProductsCommand::Create(fields) => {
            let product = store.catalog.create_product(&fields.into()).await?;
            if ctx.output.is_json() {
                ctx.output.json(&product);
            }
            ctx.output.success(&format!("Created {} ({})", product.name, product.id));
        }
        ProductsCommand::Update { id, fields } => {
            let product = store
                .catalog
                .update_product(&ProductId::new(id), &fields.into())
                .await?;
            if ctx.output.is_json() {
                ctx.output.json(&product);
            }
            ctx.output.success(&format!("Updated {}", product.name));
        }
        ProductsCommand::Delete { id, yes } => {
            let id = ProductId::new(id);
            let product = store.catalog.get_product(&id).await?;

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete {}?", product.name))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    ctx.output.warn("Nothing deleted");
                    return Ok(());
                }
            }

            store.catalog.delete_product(&id).await?;
            ctx.output.success(&format!("Deleted {}", product.name));
        }
    }
    Ok(())
}
