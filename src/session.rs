use crate::models::{AppFile, Message, Role};

pub const BASE_CONTEXT: &str = "You are a coding assistant for developers, you help developers create applications, you specify one by one the files needed to build an application telling the file name, the file path and the file content. You specify the file path as a valid relative path starting with a point '.'. You must return the answer as a json array of objects with the keys fileName, filePath and fileContent, the user is a computer that needs to be able to parse your answer. You don't give explanations you don't show the commands needed to run.";

pub const EXAMPLE_PROMPT: &str = "Create a terraform project for a resource group";

const EXAMPLE_NAME: &str = "main.tf";
const EXAMPLE_PATH: &str = "./";
const EXAMPLE_CONTENT: &str = "
# Configure the Azure provider
provider \"azurerm\" {
\tfeatures {}
}

# Create a resource group
resource \"azurerm_resource_group\" \"aks\" {
\tname     = var.resource_group_name
\tlocation = var.resource_group_location
}
";

/// The worked example answer, serialized the way the model is asked to reply.
pub fn example_answer() -> String {
    let files = [AppFile {
        name: EXAMPLE_NAME.to_string(),
        path: EXAMPLE_PATH.to_string(),
        content: EXAMPLE_CONTENT.to_string(),
    }];
    serde_json::to_string(&files).unwrap_or_default()
}

/// Seed transcript for chat deployments: instructions plus one worked turn.
pub fn initial_messages(chat_context: &str) -> Vec<Message> {
    let system = if chat_context.trim().is_empty() {
        BASE_CONTEXT.to_string()
    } else {
        format!("{}\n{}", BASE_CONTEXT, chat_context)
    };
    vec![
        Message::new(Role::System, system),
        Message::new(Role::User, EXAMPLE_PROMPT),
        Message::new(Role::Assistant, example_answer()),
    ]
}

/// Seed prompt history for completion deployments.
pub fn initial_prompts(chat_context: &str) -> Vec<String> {
    let mut prompts = vec![BASE_CONTEXT.to_string()];
    if !chat_context.trim().is_empty() {
        prompts.push(chat_context.to_string());
    }
    prompts.push(format!("An example answer for the question \"{}\" would be:", EXAMPLE_PROMPT));
    prompts.push(example_answer());
    prompts
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED_ANSWER: &str = r#"[{"fileName":"main.tf","filePath":"./","fileContent":"\n# Configure the Azure provider\nprovider \"azurerm\" {\n\tfeatures {}\n}\n\n# Create a resource group\nresource \"azurerm_resource_group\" \"aks\" {\n\tname     = var.resource_group_name\n\tlocation = var.resource_group_location\n}\n"}]"#;

    #[test]
    fn example_answer_is_parseable_json() {
        assert_eq!(example_answer(), EXPECTED_ANSWER);
        let files = AppFile::parse_list(&example_answer()).unwrap();
        assert_eq!(files[0].name, "main.tf");
    }

    #[test]
    fn chat_seed_has_three_turns() {
        let messages = initial_messages("You create html applications");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, format!("{}\nYou create html applications", BASE_CONTEXT));
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, EXAMPLE_PROMPT);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, EXPECTED_ANSWER);
    }

    #[test]
    fn chat_seed_without_context() {
        let messages = initial_messages("");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, BASE_CONTEXT);
    }

    #[test]
    fn completion_seed() {
        let prompts = initial_prompts("You create html applications");
        assert_eq!(prompts.len(), 4);
        assert_eq!(prompts[0], BASE_CONTEXT);
        assert_eq!(prompts[1], "You create html applications");
        assert_eq!(
            prompts[2],
            r#"An example answer for the question "Create a terraform project for a resource group" would be:"#
        );
        assert_eq!(prompts[3], EXPECTED_ANSWER);

        assert_eq!(initial_prompts("  ").len(), 3);
    }
}
