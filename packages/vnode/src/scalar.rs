use vnode_traits::{Error, Node, Reference, SourceOptions};

use crate::create_element::scalar_node;

/// Build a standalone scalar node for `value` and register it with the context.
///
/// Only strings and numbers can be scalars. Any other reference returns `None` without touching
/// the context.
pub async fn get_scalar(options: &SourceOptions, value: Reference) -> Result<Option<Node>, Error> {
    if !value.is_scalar_value() {
        return Ok(None);
    }

    let node = scalar_node(options.reference.clone(), value, options);
    options
        .context
        .set(node.reference().clone(), node.clone())
        .await?;
    Ok(Some(node))
}
